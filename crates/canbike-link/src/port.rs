//! Serial port opening and enumeration.

use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{error, info};

use crate::error::{LinkError, LinkResult};

/// Default line rate of both controller ports.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Default inbound read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How to open one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSettings {
    pub path: String,
    pub baud: u32,
    pub timeout: Duration,
}

impl PortSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud: DEFAULT_BAUD,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    #[must_use]
    pub fn baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Open one port.
///
/// # Errors
///
/// [`LinkError::PortOpen`] when the device is missing, busy, or rejects the
/// settings.
pub fn open_port(settings: &PortSettings) -> LinkResult<Box<dyn SerialPort>> {
    let port = serialport::new(&settings.path, settings.baud)
        .timeout(settings.timeout)
        .open()
        .map_err(|source| LinkError::PortOpen {
            port: settings.path.clone(),
            baud: settings.baud,
            source,
        })?;
    info!(port = %settings.path, baud = settings.baud, "serial port opened");
    Ok(port)
}

/// The two controller links.
pub struct PortPair {
    /// Engine controller; operator commands are written here
    pub ecu: Box<dyn SerialPort>,
    /// Actuator controller; telemetry lines are read from here
    pub actuator: Box<dyn SerialPort>,
}

impl std::fmt::Debug for PortPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortPair")
            .field("ecu", &self.ecu.name())
            .field("actuator", &self.actuator.name())
            .finish()
    }
}

/// Open the ECU port, then the actuator port. If the actuator port fails
/// the ECU port is closed before the error is returned.
///
/// # Errors
///
/// [`LinkError::PortOpen`] for whichever port failed.
pub fn open_port_pair(ecu: &PortSettings, actuator: &PortSettings) -> LinkResult<PortPair> {
    let ecu_port = open_port(ecu).inspect_err(|e| error!(error = %e, "ECU port unavailable"))?;
    match open_port(actuator) {
        Ok(actuator_port) => Ok(PortPair {
            ecu: ecu_port,
            actuator: actuator_port,
        }),
        Err(e) => {
            error!(error = %e, "actuator port unavailable, closing ECU port");
            drop(ecu_port);
            Err(e)
        }
    }
}

/// One enumerated port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub path: String,
    pub description: String,
}

/// List serial ports known to the OS.
///
/// # Errors
///
/// [`LinkError::PortList`] if enumeration itself fails.
pub fn list_ports() -> LinkResult<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(LinkError::PortList)?;
    Ok(ports
        .into_iter()
        .map(|port| PortInfo {
            description: describe(&port.port_type),
            path: port.port_name,
        })
        .collect())
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut text = format!("USB {:04x}:{:04x}", usb.vid, usb.pid);
            if let Some(product) = &usb.product {
                text.push(' ');
                text.push_str(product);
            }
            text
        }
        SerialPortType::PciPort => "PCI".to_owned(),
        SerialPortType::BluetoothPort => "Bluetooth".to_owned(),
        SerialPortType::Unknown => "unknown".to_owned(),
    }
}
