pub mod aggregate;
pub mod dto;

pub use aggregate::{
    enrich_from_catalog, normalize_smart_list, normalize_smart_lists, SmartList, SmartListItem,
    SMART_LIST_RULES,
};
pub use dto::{
    AddSmartListItemRequest, CreateSmartListRequest, RemoveSmartListItemRequest,
    UpdateSmartListItemRequest,
};
