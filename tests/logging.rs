use std::sync::Mutex;

use log::{Level, LevelFilter, Metadata, Record};
use pmu_cycle_counter::sim::SimulatedPmu;
use pmu_cycle_counter::CycleCounter;

struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.lines.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

#[test]
fn lifecycle_logs_enable_measure_disable_in_order() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Info);

    let sim = SimulatedPmu::new();
    let counter = CycleCounter::start(&sim).unwrap();
    let delta = counter.measure(|| {});
    counter.stop().unwrap();

    let lines = LOGGER.lines.lock().unwrap().clone();
    assert_eq!(
        lines,
        vec![
            "PMU access enabled.".to_string(),
            format!("PMU Test - CPU cycle count: {}", delta.cycles()),
            "PMU access disabled.".to_string(),
        ]
    );
}
