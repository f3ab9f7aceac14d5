use std::io::{self, BufRead, Write};

use sift_core::{CoreResult, Descriptor, Feature, FeatureSet, FeatureSetBuilder, DESCRIPTOR_LENGTH};

/// Token count of the `x y sigma ori desc[128]` layout
const LAYOUT_PLAIN: usize = 4 + DESCRIPTOR_LENGTH;
/// Token count of the `x y inverse_variance <2 unused> desc[128]` layout
const LAYOUT_INVERSE_VARIANCE: usize = 5 + DESCRIPTOR_LENGTH;

/// One record parsed from the legacy descriptor text format.
///
/// Deliberately decoupled from [`sift_core::Feature`]: the matcher works
/// on externally serialized data, not on a live feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeature {
    pub x: f32,
    pub y: f32,
    pub sigma: f32,
    /// Orientation in radians
    pub ori: f32,
    pub desc: [f32; DESCRIPTOR_LENGTH],
}

#[derive(Debug, Clone)]
pub enum ParseError {
    /// The line matched neither recognized token layout
    MalformedRecord { line: String, token_count: usize },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedRecord { line, token_count } => {
                write!(
                    f,
                    "The keypoint line contains an unexpected number of floats ({}): {}",
                    token_count, line
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Split on whitespace and parse tokens as f32 left to right, stopping at
/// the first token that is not a number (legacy stream-extraction
/// semantics). The returned count, not the raw token count, decides which
/// layout applies.
pub fn float_tokens(line: &str) -> Vec<f32> {
    line.split_whitespace()
        .map_while(|token| token.parse::<f32>().ok())
        .collect()
}

impl ParsedFeature {
    /// Build a record from already tokenized floats.
    ///
    /// 132 tokens: `x, y, sigma, ori, desc[128]` taken verbatim.
    /// 133 tokens: `x, y, inverse_variance, <2 unused>, desc[128]`;
    /// sigma is derived as `sqrt(1 / iv)` (0 when iv is 0) and ori is 0.
    pub fn from_floats(line: &str, values: &[f32]) -> ParseResult<Self> {
        let mut desc = [0.0; DESCRIPTOR_LENGTH];
        match values.len() {
            LAYOUT_PLAIN => {
                desc.copy_from_slice(&values[4..]);
                Ok(Self {
                    x: values[0],
                    y: values[1],
                    sigma: values[2],
                    ori: values[3],
                    desc,
                })
            }
            LAYOUT_INVERSE_VARIANCE => {
                let inverse_variance = values[2];
                let sigma = if inverse_variance == 0.0 {
                    0.0
                } else {
                    (1.0 / inverse_variance).sqrt()
                };
                desc.copy_from_slice(&values[5..]);
                Ok(Self {
                    x: values[0],
                    y: values[1],
                    sigma,
                    ori: 0.0,
                    desc,
                })
            }
            token_count => Err(ParseError::MalformedRecord {
                line: line.to_string(),
                token_count,
            }),
        }
    }
}

/// Tokenize and decode one line
pub fn parse_line(line: &str) -> ParseResult<ParsedFeature> {
    let values = float_tokens(line);
    ParsedFeature::from_floats(line, &values)
}

/// Ingestion counters for one input source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines decoded into a record
    pub decoded: usize,
    /// Lines that matched neither layout
    pub skipped: usize,
}

/// Read a whole descriptor file line by line.
///
/// Malformed lines are skipped and counted, never fatal. Per-line float
/// counts and skip messages go to the caller-supplied diagnostic writer;
/// only I/O failures on the reader or the writer abort the pass.
pub fn read_features<R: BufRead, W: Write>(
    reader: R,
    diag: &mut W,
) -> io::Result<(Vec<ParsedFeature>, IngestStats)> {
    let mut records = Vec::new();
    let mut stats = IngestStats::default();

    for line in reader.lines() {
        let line = line?;
        let values = float_tokens(&line);
        writeln!(diag, "Found {} floats in line", values.len())?;
        match ParsedFeature::from_floats(&line, &values) {
            Ok(record) => {
                records.push(record);
                stats.decoded += 1;
            }
            Err(error) => {
                writeln!(diag, "{}", error)?;
                stats.skipped += 1;
            }
        }
    }

    Ok((records, stats))
}

/// Fold parsed records into an owning [`FeatureSet`], one feature with a
/// single orientation/descriptor pair per record.
pub fn collect_feature_set(records: &[ParsedFeature]) -> CoreResult<FeatureSet> {
    let mut builder = FeatureSetBuilder::new();
    for record in records {
        let index = builder.push_descriptor(Descriptor::new(record.desc));
        builder.push_feature(Feature::with_single_orientation(
            record.x, record.y, record.sigma, record.ori, index,
        ))?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::FormatConfig;

    fn plain_line(x: f32, y: f32, sigma: f32, ori: f32, desc_value: f32) -> String {
        let mut line = format!("{} {} {} {}", x, y, sigma, ori);
        for _ in 0..DESCRIPTOR_LENGTH {
            line.push_str(&format!(" {}", desc_value));
        }
        line
    }

    fn inverse_variance_line(x: f32, y: f32, iv: f32, desc_value: f32) -> String {
        let mut line = format!("{} {} {} 9.9 8.8", x, y, iv);
        for _ in 0..DESCRIPTOR_LENGTH {
            line.push_str(&format!(" {}", desc_value));
        }
        line
    }

    #[test]
    fn test_plain_layout_verbatim() {
        let record = parse_line(&plain_line(10.5, 20.25, 1.6, 0.75, 0.125)).unwrap();
        assert_eq!(record.x, 10.5);
        assert_eq!(record.y, 20.25);
        assert_eq!(record.sigma, 1.6);
        assert_eq!(record.ori, 0.75);
        assert!(record.desc.iter().all(|&v| v == 0.125));
    }

    #[test]
    fn test_inverse_variance_layout_derives_sigma() {
        let record = parse_line(&inverse_variance_line(1.0, 2.0, 4.0, 0.5)).unwrap();
        assert_eq!(record.sigma, 0.5);
        // Orientation defaults to zero, skipped tokens are ignored
        assert_eq!(record.ori, 0.0);
        assert!(record.desc.iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_inverse_variance_zero_gives_zero_sigma() {
        let record = parse_line(&inverse_variance_line(1.0, 2.0, 0.0, 0.5)).unwrap();
        assert_eq!(record.sigma, 0.0);
        assert_eq!(record.ori, 0.0);
    }

    #[test]
    fn test_unexpected_token_count_is_malformed() {
        let mut line = String::from("1 2 3");
        for _ in 0..DESCRIPTOR_LENGTH {
            line.push_str(" 0.5");
        }
        // 131 tokens, one short of the plain layout
        let result = parse_line(&line);
        assert!(matches!(
            result,
            Err(ParseError::MalformedRecord { token_count: 131, .. })
        ));
    }

    #[test]
    fn test_tokenization_stops_at_first_bad_token() {
        assert_eq!(float_tokens("1.0 2.5 oops 3.0"), vec![1.0, 2.5]);
        assert_eq!(float_tokens(""), Vec::<f32>::new());
        assert_eq!(float_tokens("nonsense"), Vec::<f32>::new());
    }

    #[test]
    fn test_read_features_skips_malformed_and_continues() {
        let good = plain_line(1.0, 2.0, 1.0, 0.0, 0.25);
        let input = format!("{}\nnot a record\n{}\n", good, good);
        let mut diag = Vec::new();
        let (records, stats) = read_features(input.as_bytes(), &mut diag).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(stats, IngestStats { decoded: 2, skipped: 1 });
        let diag = String::from_utf8(diag).unwrap();
        assert!(diag.contains("Found 132 floats in line"));
        assert!(diag.contains("Found 0 floats in line"));
        assert!(diag.contains("unexpected number of floats (0)"));
    }

    #[test]
    fn test_collect_feature_set_indices_are_valid() {
        let records = vec![
            parse_line(&plain_line(1.0, 2.0, 1.0, 0.1, 0.25)).unwrap(),
            parse_line(&plain_line(3.0, 4.0, 2.0, 0.2, 0.75)).unwrap(),
        ];
        let set = collect_feature_set(&records).unwrap();
        assert_eq!(set.len(), 2);
        for feature in set.features() {
            assert!(set.descriptor_for(feature, 0).is_some());
        }
        assert_eq!(set.descriptor_for(&set.features()[1], 0).unwrap().features[0], 0.75);
    }

    #[test]
    fn test_print_roundtrip_preserves_floats() {
        let original = parse_line(&plain_line(10.5, 20.25, 1.6, 0.75, 0.125)).unwrap();
        let set = collect_feature_set(std::slice::from_ref(&original)).unwrap();

        let mut printed = Vec::new();
        set.write(&mut printed, &FormatConfig::default()).unwrap();
        let printed = String::from_utf8(printed).unwrap();

        // Printed layout is x y sigma num_descs ori desc[128]
        let values = float_tokens(&printed);
        assert_eq!(values.len(), 5 + DESCRIPTOR_LENGTH);
        assert_eq!(values[0], original.x);
        assert_eq!(values[1], original.y);
        assert_eq!(values[2], original.sigma);
        assert_eq!(values[4], original.ori);
        assert_eq!(&values[5..], &original.desc);
    }
}
