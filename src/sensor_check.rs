use std::thread;
use std::time::Duration;

use sweep_mppt::Config;
use sweep_mppt::actuator::{Actuator, PwmActuator};
use sweep_mppt::adc::Ads1115Adc;
use sweep_mppt::telemetry::TelemetrySampler;

const SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

// Usage:
//  sensor-check [config.json] [duty]
//
//  Holds the gate at `duty` (default: the configured safe duty cycle) and
//  prints raw and calibrated readings of all four channels until Ctrl+C.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let config = Config::load_or_default(args.next().as_deref())?;
    config.validate()?;
    let duty: f64 = match args.next() {
        Some(arg) => arg.parse()?,
        None => config.safe_duty_cycle,
    };

    let board = config.board()?;
    let profile = board.profile();

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║     Converter Sense Channel Check                    ║");
    println!("╚══════════════════════════════════════════════════════╝\n");
    println!("Board:     {}", board);
    println!("Channels:  {:?}", profile.channels);
    println!("Gate duty: {:.3}\n", duty);

    let mut actuator = PwmActuator::new(
        config.pwm_channel,
        config.pwm_frequency_hz,
        config.actuator_polarity_inverted,
        duty,
    )?;
    actuator.set_duty(duty);

    let adc = Ads1115Adc::new(config.adc_address, config.adc_reference_volts)?;
    let mut sampler = TelemetrySampler::new(adc, profile);

    println!(
        "{:^35} || {:^43} | {:^6}",
        "RAW INV | INI | OUTV | OUTI", "CAL INV (V) | INI (A) | OUTV (V) | OUTI (A)", "EFF"
    );
    println!("{:-<35}-++-{:-<43}-+-{:-<6}", "", "", "");

    loop {
        let raw = sampler.sample_raw();
        let reading = sampler.calibrate(&raw);

        let efficiency = reading
            .efficiency()
            .map(|e| format!("{:.3}", e))
            .unwrap_or_else(|| "n/a".to_owned());
        println!(
            "{:.4} | {:.4} | {:.4} | {:.4} || {:>9.3} | {:>7.3} | {:>8.3} | {:>8.3} | {:>6}",
            raw.input_voltage,
            raw.input_current,
            raw.output_voltage,
            raw.output_current,
            reading.input_voltage,
            reading.input_current,
            reading.output_voltage,
            reading.output_current,
            efficiency
        );

        thread::sleep(SAMPLE_INTERVAL);
    }
}
