//! Short synthesized chime for incoming notifications.

/// Play a two-tone chime through Web Audio. Best effort: any failure (no
/// audio context, autoplay policy) is swallowed.
pub fn play_chime() {
    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = chime() {
            log::debug!("notification chime unavailable: {:?}", e);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn chime() -> Result<(), wasm_bindgen::JsValue> {
    use web_sys::{AudioContext, OscillatorType};

    let ctx = AudioContext::new()?;
    let now = ctx.current_time();

    let gain = ctx.create_gain()?;
    gain.gain().set_value_at_time(0.0001, now)?;
    gain.gain().exponential_ramp_to_value_at_time(0.2, now + 0.02)?;
    gain.gain().exponential_ramp_to_value_at_time(0.0001, now + 0.35)?;
    gain.connect_with_audio_node(&ctx.destination())?;

    for (freq, offset) in [(880.0_f32, 0.0_f64), (1320.0, 0.12)] {
        let osc = ctx.create_oscillator()?;
        osc.set_type(OscillatorType::Sine);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain)?;
        osc.start_with_when(now + offset)?;
        osc.stop_with_when(now + offset + 0.2)?;
    }
    Ok(())
}
