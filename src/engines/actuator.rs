//! 奖励执行器：模拟投喂器 / sysfs GPIO 输出

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::EngineError;

/// 执行器 trait：触发奖励 `seconds` 秒
pub trait RewardActuator: Send {
    fn name(&self) -> &str;

    fn trigger(&self, seconds: f64) -> Result<(), EngineError>;
}

/// 模拟执行器：只记日志，最多阻塞 50ms
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedActuator;

impl RewardActuator for SimulatedActuator {
    fn name(&self) -> &str {
        "simulated"
    }

    fn trigger(&self, seconds: f64) -> Result<(), EngineError> {
        tracing::info!("[REWARD] Simulated dispenser {:.2}s", seconds);
        std::thread::sleep(Duration::from_secs_f64(seconds.clamp(0.0, 0.05)));
        Ok(())
    }
}

/// sysfs GPIO 执行器：向 `<root>/gpio<pin>/value` 写 1，保持后写 0；
/// 引脚未导出或不可写时回落到模拟执行器
#[derive(Debug, Clone)]
pub struct SysfsGpioActuator {
    pin: u32,
    value_path: PathBuf,
    available: bool,
}

impl SysfsGpioActuator {
    pub const DEFAULT_ROOT: &'static str = "/sys/class/gpio";

    pub fn new(pin: u32) -> Self {
        Self::with_root(pin, Self::DEFAULT_ROOT)
    }

    pub fn with_root(pin: u32, root: impl AsRef<Path>) -> Self {
        let value_path = root.as_ref().join(format!("gpio{pin}")).join("value");
        let available = value_path.is_file();
        if !available {
            tracing::warn!(pin, path = %value_path.display(), "GPIO pin not available, rewards will be simulated");
        }
        Self {
            pin,
            value_path,
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn write_value(&self, value: &str) -> Result<(), EngineError> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.value_path)
            .map_err(|e| EngineError::Failed(format!("gpio{}: {}", self.pin, e)))?;
        file.write_all(value.as_bytes())
            .map_err(|e| EngineError::Failed(format!("gpio{}: {}", self.pin, e)))
    }
}

impl RewardActuator for SysfsGpioActuator {
    fn name(&self) -> &str {
        "gpio"
    }

    fn trigger(&self, seconds: f64) -> Result<(), EngineError> {
        if !self.available {
            return SimulatedActuator.trigger(seconds);
        }
        self.write_value("1")?;
        std::thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
        self.write_value("0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_trigger() {
        assert!(SimulatedActuator.trigger(0.4).is_ok());
        assert!(SimulatedActuator.trigger(-1.0).is_ok());
    }

    #[test]
    fn test_gpio_missing_pin_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let gpio = SysfsGpioActuator::with_root(17, dir.path());
        assert!(!gpio.is_available());
        assert!(gpio.trigger(0.01).is_ok());
    }

    #[test]
    fn test_gpio_writes_low_after_pulse() {
        let dir = tempfile::tempdir().unwrap();
        let pin_dir = dir.path().join("gpio4");
        std::fs::create_dir_all(&pin_dir).unwrap();
        std::fs::write(pin_dir.join("value"), "0").unwrap();
        let gpio = SysfsGpioActuator::with_root(4, dir.path());
        assert!(gpio.is_available());
        gpio.trigger(0.01).unwrap();
        assert_eq!(std::fs::read_to_string(pin_dir.join("value")).unwrap(), "0");
    }
}
