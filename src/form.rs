use crate::types::{Configuration, FieldValue};
use std::sync::{Arc, Mutex, PoisonError};

/// An input control whose value can be read and written as text
///
/// Controls use interior mutability, the way a DOM input element does, so a
/// form can update them through a shared reference.
pub trait FormControl {
    fn set_value(&self, value: &str);
    fn value(&self) -> String;
}

impl<T: FormControl + ?Sized> FormControl for Arc<T> {
    fn set_value(&self, value: &str) {
        (**self).set_value(value)
    }

    fn value(&self) -> String {
        (**self).value()
    }
}

/// In-memory text input
///
/// Clones share the same underlying value, so one handle can be given to a
/// form while another is kept for reading.
#[derive(Clone, Debug, Default)]
pub struct TextInput {
    value: Arc<Mutex<String>>,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(value.into())),
        }
    }
}

impl FormControl for TextInput {
    fn set_value(&self, value: &str) {
        let mut current = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        value.clone_into(&mut *current);
    }

    fn value(&self) -> String {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// The two controls bound to the device configuration
#[derive(Clone, Debug)]
pub struct ConfigForm<Brightness, ClockFormat>
where
    Brightness: FormControl,
    ClockFormat: FormControl,
{
    brightness: Brightness,
    clock_format_string: ClockFormat,
}

impl<Brightness, ClockFormat> ConfigForm<Brightness, ClockFormat>
where
    Brightness: FormControl,
    ClockFormat: FormControl,
{
    pub fn new(brightness: Brightness, clock_format_string: ClockFormat) -> Self {
        Self {
            brightness,
            clock_format_string,
        }
    }

    /// Write the bound fields of `config` into the controls
    ///
    /// A field missing from `config` clears its control.
    pub fn populate(&self, config: &Configuration) {
        self.brightness.set_value(
            &config
                .brightness
                .as_ref()
                .map(FieldValue::to_string)
                .unwrap_or_default(),
        );
        self.clock_format_string.set_value(
            &config
                .clock_format_string
                .as_ref()
                .map(FieldValue::to_string)
                .unwrap_or_default(),
        );
    }

    pub fn brightness(&self) -> &Brightness {
        &self.brightness
    }

    pub fn clock_format_string(&self) -> &ClockFormat {
        &self.clock_format_string
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> (ConfigForm<TextInput, TextInput>, TextInput, TextInput) {
        let brightness = TextInput::default();
        let clock_format = TextInput::default();
        (
            ConfigForm::new(brightness.clone(), clock_format.clone()),
            brightness,
            clock_format,
        )
    }

    #[test]
    fn test_populate_round_trip() {
        let (form, brightness, clock_format) = form();
        let config = Configuration {
            brightness: Some(80u8.into()),
            clock_format_string: Some("HH:mm".into()),
            ..Default::default()
        };

        form.populate(&config);

        assert_eq!(brightness.value(), "80");
        assert_eq!(clock_format.value(), "HH:mm");
    }

    #[test]
    fn test_populate_clears_missing_fields() {
        let (form, brightness, clock_format) = form();
        brightness.set_value("15");
        clock_format.set_value("%-H:%M");

        form.populate(&Configuration::default());

        assert_eq!(brightness.value(), "");
        assert_eq!(clock_format.value(), "");
    }

    #[test]
    fn test_populate_ignores_extra_fields() {
        let (form, brightness, _) = form();
        let config: Configuration =
            serde_json::from_str(r#"{"brightness":7,"debugLevel":3}"#).expect("invalid json");

        form.populate(&config);

        assert_eq!(brightness.value(), "7");
        assert_eq!(form.clock_format_string().value(), "");
    }

    #[test]
    fn test_populate_renders_any_field_type() {
        let (form, brightness, clock_format) = form();
        let config: Configuration =
            serde_json::from_str(r#"{"brightness":true,"clockFormatString":1234}"#)
                .expect("invalid json");

        form.populate(&config);

        assert_eq!(brightness.value(), "true");
        assert_eq!(clock_format.value(), "1234");
    }

    #[test]
    fn test_shared_controls() {
        let brightness = Arc::new(TextInput::new("1"));
        let form = ConfigForm::new(brightness.clone(), TextInput::default());

        form.populate(&Configuration {
            brightness: Some(2u8.into()),
            ..Default::default()
        });

        assert_eq!(brightness.value(), "2");
        assert_eq!(form.brightness().value(), "2");
    }
}
