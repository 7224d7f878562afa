use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

//==============================================================================
// Numeric Tags
//==============================================================================

/// How lifetime and density magnitudes are rendered in tags and sheet names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
    /// Two decimals of mantissa: `τ=1.00e-3`
    #[default]
    Fixed,
    /// Mantissa only: `τ=1e-3`
    Short,
}

impl TagStyle {
    pub fn format_exponent(self, value: f64) -> String {
        match self {
            TagStyle::Fixed => format!("{:.2e}", value),
            TagStyle::Short => format!("{:.0e}", value),
        }
    }
}

/// A numeric experiment parameter carried together with its display form.
///
/// Ordering and equality use the numeric value, so `τ=5.00e-10` sorts before
/// `τ=2.00e-9` even though the strings sort the other way.
#[derive(Debug, Clone)]
pub struct Tag {
    value: f64,
    display: String,
}

impl Tag {
    /// Voltage tag: `5V`
    pub fn voltage(value: f64) -> Self {
        Self {
            value,
            display: format!("{}V", value),
        }
    }

    /// Carrier lifetime tag: `τ=1.00e-3`
    pub fn lifetime(value: f64, style: TagStyle) -> Self {
        Self {
            value,
            display: format!("τ={}", style.format_exponent(value)),
        }
    }

    /// Carrier density tag: `D=1.00e-4`
    pub fn density(value: f64, style: TagStyle) -> Self {
        Self {
            value,
            display: format!("D={}", style.format_exponent(value)),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    /// The display form without its `name=` prefix (`1.00e-4` for `D=1.00e-4`)
    pub fn magnitude(&self) -> &str {
        self.display
            .split_once('=')
            .map_or(self.display.as_str(), |(_, magnitude)| magnitude)
    }

    /// Whether this tag's value matches `value` up to float formatting noise
    pub fn approx_eq(&self, value: f64) -> bool {
        let scale = self.value.abs().max(value.abs());
        (self.value - value).abs() <= scale * 1e-9
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Tag {}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.display.cmp(&other.display))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

//==============================================================================
// Device Names
//==============================================================================

/// Free-text device name, ordered naturally (`PC2` before `PC10`, case-insensitive text)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceName(String);

impl DeviceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialOrd for DeviceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceName {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0).then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalChunk {
    /// Digit run with leading zeros stripped, compared by length then digits
    Number(usize, String),
    Text(String),
}

fn natural_chunks(s: &str) -> Vec<NaturalChunk> {
    let mut chunks = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&first) = chars.peek() {
        let is_digit = first.is_ascii_digit();
        let mut run = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() != is_digit {
                break;
            }
            run.push(c);
            chars.next();
        }

        if is_digit {
            let trimmed = run.trim_start_matches('0');
            chunks.push(NaturalChunk::Number(trimmed.len(), trimmed.to_string()));
        } else {
            chunks.push(NaturalChunk::Text(run.to_lowercase()));
        }
    }

    chunks
}

/// Compare two strings with digit runs compared numerically and text case-insensitively
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_chunks(a).cmp(&natural_chunks(b))
}

//==============================================================================
// Experiment Keys
//==============================================================================

/// The four fields a measurement file name encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyField {
    Device,
    Voltage,
    Lifetime,
    Density,
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyField::Device => "device",
            KeyField::Voltage => "voltage",
            KeyField::Lifetime => "lifetime",
            KeyField::Density => "density",
        };
        f.write_str(name)
    }
}

/// One experimental condition. The derived ordering (device, voltage, lifetime,
/// density) is the hierarchy order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExperimentKey {
    pub device: DeviceName,
    pub voltage: Tag,
    pub lifetime: Tag,
    pub density: Tag,
}

impl ExperimentKey {
    pub fn new(device: DeviceName, voltage: Tag, lifetime: Tag, density: Tag) -> Self {
        Self {
            device,
            voltage,
            lifetime,
            density,
        }
    }

    /// Preferred worksheet name for this condition's raw data
    pub fn sheet_name(&self) -> String {
        format!(
            "{} {} {} {}",
            self.device, self.voltage, self.lifetime, self.density
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_display_fixed_and_short() {
        assert_eq!(Tag::voltage(5.0).display(), "5V");
        assert_eq!(Tag::lifetime(0.001, TagStyle::Fixed).display(), "τ=1.00e-3");
        assert_eq!(Tag::density(0.0001, TagStyle::Fixed).display(), "D=1.00e-4");
        assert_eq!(Tag::lifetime(1e-7, TagStyle::Short).display(), "τ=1e-7");
    }

    #[test]
    fn test_tag_orders_numerically_not_lexically() {
        let small = Tag::lifetime(5e-10, TagStyle::Fixed);
        let large = Tag::lifetime(2e-9, TagStyle::Fixed);
        assert_eq!(small.display(), "τ=5.00e-10");
        assert_eq!(large.display(), "τ=2.00e-9");
        assert!(small.display() > large.display());
        assert!(small < large);

        assert!(Tag::voltage(5.0) < Tag::voltage(100.0));
    }

    #[test]
    fn test_tag_magnitude() {
        assert_eq!(Tag::density(0.0001, TagStyle::Fixed).magnitude(), "1.00e-4");
        assert_eq!(Tag::voltage(5.0).magnitude(), "5V");
    }

    #[test]
    fn test_tag_approx_eq() {
        let tag = Tag::lifetime(1e-7, TagStyle::Fixed);
        assert!(tag.approx_eq(0.0000001));
        assert!(!tag.approx_eq(1e-6));
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("PC2", "PC10"), Ordering::Less);
        assert_eq!(natural_cmp("diode", "PC"), Ordering::Less);
        assert_eq!(natural_cmp("Diode", "diode"), Ordering::Equal);
        assert_eq!(natural_cmp("PC007", "PC7"), Ordering::Equal);
    }

    #[test]
    fn test_device_name_ordering_is_total() {
        let mut devices = vec![
            DeviceName::new("PC10"),
            DeviceName::new("PC2"),
            DeviceName::new("Diode"),
        ];
        devices.sort();
        let names: Vec<&str> = devices.iter().map(DeviceName::as_str).collect();
        assert_eq!(names, vec!["Diode", "PC2", "PC10"]);

        assert_ne!(DeviceName::new("pc"), DeviceName::new("PC"));
    }

    #[test]
    fn test_sheet_name() {
        let key = ExperimentKey::new(
            DeviceName::new("PC"),
            Tag::voltage(5.0),
            Tag::lifetime(0.001, TagStyle::Fixed),
            Tag::density(0.0001, TagStyle::Fixed),
        );
        assert_eq!(key.sheet_name(), "PC 5V τ=1.00e-3 D=1.00e-4");
    }
}
