use std::io::{self, Write};

use crate::{Feature, FeatureSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Output formatting options for feature printing
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatConfig {
    /// Quantize descriptor components to unsigned byte range instead of
    /// emitting raw floats. Components are assumed normalized; each is
    /// mapped as round(v * 255).
    pub write_as_uchar: bool,
}

/// Map a normalized descriptor component into [0, 255]
pub fn quantize_component(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

impl Feature {
    /// Write this feature as one line: position, sigma, orientation count,
    /// then per populated slot the orientation and its 128 descriptor
    /// components. Descriptors are resolved against the owning set's
    /// buffer, which the caller passes in.
    pub fn write<W: Write>(
        &self,
        writer: &mut W,
        descriptors: &[crate::Descriptor],
        config: &FormatConfig,
    ) -> io::Result<()> {
        write!(writer, "{} {} {} {}", self.x, self.y, self.sigma, self.num_descs)?;
        for slot in 0..self.num_descs {
            write!(writer, " {}", self.orientations[slot])?;
            let descriptor = self.descriptors[slot]
                .and_then(|i| descriptors.get(i))
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "descriptor index out of range")
                })?;
            for &component in &descriptor.features {
                if config.write_as_uchar {
                    write!(writer, " {}", quantize_component(component))?;
                } else {
                    write!(writer, " {}", component)?;
                }
            }
        }
        writeln!(writer)
    }
}

impl FeatureSet {
    /// Write every feature, one line each, in insertion order
    pub fn write<W: Write>(&self, writer: &mut W, config: &FormatConfig) -> io::Result<()> {
        for feature in self.features() {
            feature.write(writer, self.descriptors(), config)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buffer = Vec::new();
        self.write(&mut buffer, &FormatConfig::default())
            .map_err(|_| std::fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Descriptor, FeatureSetBuilder, DESCRIPTOR_LENGTH};

    fn single_feature_set(desc_value: f32) -> FeatureSet {
        let mut builder = FeatureSetBuilder::new();
        let index = builder.push_descriptor(Descriptor::new([desc_value; DESCRIPTOR_LENGTH]));
        builder
            .push_feature(Feature::with_single_orientation(1.5, 2.5, 1.6, 0.25, index))
            .unwrap();
        builder.finish()
    }

    #[test]
    fn test_write_raw_floats() {
        let set = single_feature_set(0.5);
        let mut out = Vec::new();
        set.write(&mut out, &FormatConfig::default()).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.starts_with("1.5 2.5 1.6 1 0.25 0.5 0.5"));
        assert_eq!(line.split_whitespace().count(), 5 + DESCRIPTOR_LENGTH);
    }

    #[test]
    fn test_write_as_uchar_quantizes() {
        let set = single_feature_set(0.5);
        let mut out = Vec::new();
        let config = FormatConfig { write_as_uchar: true };
        set.write(&mut out, &config).unwrap();
        let line = String::from_utf8(out).unwrap();
        // 0.5 * 255 = 127.5, round-to-nearest gives 128
        assert!(line.starts_with("1.5 2.5 1.6 1 0.25 128 128"));
    }

    #[test]
    fn test_quantize_component_bounds() {
        assert_eq!(quantize_component(0.0), 0);
        assert_eq!(quantize_component(1.0), 255);
        assert_eq!(quantize_component(0.4), 102);
        // values outside the normalized range clamp instead of wrapping
        assert_eq!(quantize_component(1.5), 255);
        assert_eq!(quantize_component(-0.1), 0);
    }

    #[test]
    fn test_display_matches_write() {
        let set = single_feature_set(0.25);
        let mut out = Vec::new();
        set.write(&mut out, &FormatConfig::default()).unwrap();
        assert_eq!(format!("{}", set), String::from_utf8(out).unwrap());
    }
}
