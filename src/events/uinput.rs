//! # Uinput Sink
//!
//! Registers the logical pen device with the kernel via uinput and delivers
//! event frames to it.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, InputEvent, InputId, Key, UinputAbsSetup,
};
use tracing::debug;

use super::{EventSink, PenAxis, PenKey};
use crate::error::{Result, TabletBridgeError};
use crate::report::protocol::{AxisSpec, PRESSURE_AXIS, TILT_X_AXIS, TILT_Y_AXIS, X_AXIS, Y_AXIS};

/// Axes the pen device advertises, with their declared ranges.
const AXES: [(PenAxis, AxisSpec); 5] = [
    (PenAxis::X, X_AXIS),
    (PenAxis::Y, Y_AXIS),
    (PenAxis::Pressure, PRESSURE_AXIS),
    (PenAxis::TiltX, TILT_X_AXIS),
    (PenAxis::TiltY, TILT_Y_AXIS),
];

/// [`EventSink`] implementation over an evdev uinput device.
///
/// Key and axis events are buffered and written as one batch when the frame
/// is synced, so the consumer always observes whole input frames. The
/// kernel device is unregistered when the sink is dropped.
pub struct UinputSink {
    device: VirtualDevice,
    pending: Vec<InputEvent>,
}

impl UinputSink {
    /// Register a new logical pen device.
    ///
    /// # Arguments
    ///
    /// * `name` - Device name shown to consumers (e.g. in `evtest`)
    /// * `vendor_id` / `product_id` - Identity of the physical tablet,
    ///   mirrored onto the logical device
    ///
    /// # Errors
    ///
    /// Returns `InputDevice` if uinput is unavailable or registration fails.
    pub fn create(name: &str, vendor_id: u16, product_id: u16) -> Result<Self> {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::BTN_TOOL_PEN);
        keys.insert(Key::BTN_STYLUS);

        let mut builder = VirtualDeviceBuilder::new()
            .map_err(TabletBridgeError::InputDevice)?
            .name(name)
            .input_id(InputId::new(BusType::BUS_USB, vendor_id, product_id, 0))
            .with_keys(&keys)
            .map_err(TabletBridgeError::InputDevice)?;

        for (axis, spec) in AXES {
            let setup = UinputAbsSetup::new(
                axis_code(axis),
                AbsInfo::new(0, spec.min, spec.max, 0, 0, spec.resolution),
            );
            builder = builder
                .with_absolute_axis(&setup)
                .map_err(TabletBridgeError::InputDevice)?;
        }

        let device = builder.build().map_err(TabletBridgeError::InputDevice)?;
        debug!("registered uinput pen device \"{}\"", name);

        Ok(Self {
            device,
            // One frame is at most a handful of events.
            pending: Vec::with_capacity(8),
        })
    }
}

impl EventSink for UinputSink {
    fn key(&mut self, key: PenKey, pressed: bool) -> std::io::Result<()> {
        self.pending.push(InputEvent::new_now(
            evdev::EventType::KEY,
            key_code(key).code(),
            i32::from(pressed),
        ));
        Ok(())
    }

    fn abs(&mut self, axis: PenAxis, value: i32) -> std::io::Result<()> {
        self.pending.push(InputEvent::new_now(
            evdev::EventType::ABSOLUTE,
            axis_code(axis).0,
            value,
        ));
        Ok(())
    }

    fn sync(&mut self) -> std::io::Result<()> {
        // emit() appends the SYN_REPORT marker, closing the frame.
        let result = self.device.emit(&self.pending);
        self.pending.clear();
        result
    }
}

/// Map a pen key to its evdev key code.
fn key_code(key: PenKey) -> Key {
    match key {
        PenKey::ToolPen => Key::BTN_TOOL_PEN,
        PenKey::Stylus => Key::BTN_STYLUS,
    }
}

/// Map a pen axis to its evdev absolute axis code.
fn axis_code(axis: PenAxis) -> AbsoluteAxisType {
    match axis {
        PenAxis::X => AbsoluteAxisType::ABS_X,
        PenAxis::Y => AbsoluteAxisType::ABS_Y,
        PenAxis::Pressure => AbsoluteAxisType::ABS_PRESSURE,
        PenAxis::TiltX => AbsoluteAxisType::ABS_TILT_X,
        PenAxis::TiltY => AbsoluteAxisType::ABS_TILT_Y,
    }
}
