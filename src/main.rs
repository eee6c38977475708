use sweep_mppt::actuator::PwmActuator;
use sweep_mppt::adc::Ads1115Adc;
use sweep_mppt::controller::{ControllerSettings, OperatingPointController};
use sweep_mppt::telemetry::TelemetrySampler;
use sweep_mppt::{Config, SweepRequest, SweepTrigger};

// Usage:
//  sweep-mppt [config.json]
//
//  Sweeps the converter's duty cycle every `trigger_interval_ms`, picks the
//  best step for the configured objective and holds it until the next sweep.
//  Set RUST_LOG=debug for sweep summaries, RUST_LOG=warn to silence samples.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1);
    let config = Config::load_or_default(config_path.as_deref())?;
    config.validate()?;

    let board = config.board()?;
    let settings = ControllerSettings::from_config(&config)?;
    log::info!(
        "Board {}, objective {}, duty {:.3}..{:.3} step {:.3}, sweep every {:?} (~{:?} each)",
        board,
        config.objective,
        config.duty_min,
        config.duty_max,
        config.duty_step,
        config.trigger_interval(),
        settings.sweep.duration()
    );

    let adc = Ads1115Adc::new(config.adc_address, config.adc_reference_volts)?;
    let sampler = TelemetrySampler::new(adc, board.profile());

    let actuator = PwmActuator::new(
        config.pwm_channel,
        config.pwm_frequency_hz,
        config.actuator_polarity_inverted,
        config.safe_duty_cycle,
    )?;

    let request = SweepRequest::new();
    // Kept alive for the lifetime of the control loop.
    let _trigger = SweepTrigger::spawn(request.clone(), config.trigger_interval())?;
    if config.sweep_on_start {
        request.request();
    }

    let mut controller = OperatingPointController::new(sampler, actuator, settings, request);
    log::info!("Control loop started");
    controller.run()
}
