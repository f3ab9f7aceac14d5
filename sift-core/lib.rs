pub mod format;

pub use format::FormatConfig;

/// Number of components in a SIFT descriptor vector
pub const DESCRIPTOR_LENGTH: usize = 128;

/// Maximum number of orientations (and thus descriptors) per feature
pub const ORIENTATION_MAX_COUNT: usize = 3;

/// Fixed-length appearance signature of one feature.
///
/// Immutable once constructed; its only identity is its slot in the
/// owning [`FeatureSet`]'s descriptor buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub features: [f32; DESCRIPTOR_LENGTH],
}

impl Descriptor {
    pub fn new(features: [f32; DESCRIPTOR_LENGTH]) -> Self {
        Self { features }
    }
}

/// One detected keypoint with up to [`ORIENTATION_MAX_COUNT`]
/// orientation/descriptor pairs.
///
/// Descriptor slots hold indices into the owning [`FeatureSet`]'s
/// descriptor buffer, never into another set. The feature does not own
/// descriptor memory; the index is relation + lookup only.
#[derive(Debug, Clone)]
pub struct Feature {
    pub x: f32,
    pub y: f32,
    /// Characteristic scale (sigma)
    pub sigma: f32,
    /// Number of populated orientation slots; remaining slots are unused
    pub num_descs: usize,
    /// Orientations in radians, parallel to `descriptors`
    pub orientations: [f32; ORIENTATION_MAX_COUNT],
    /// Indices into the owning set's descriptor buffer
    pub descriptors: [Option<usize>; ORIENTATION_MAX_COUNT],
}

impl Feature {
    /// Create a feature with a single orientation/descriptor pair
    pub fn with_single_orientation(x: f32, y: f32, sigma: f32, ori: f32, desc_index: usize) -> Self {
        let mut orientations = [0.0; ORIENTATION_MAX_COUNT];
        let mut descriptors = [None; ORIENTATION_MAX_COUNT];
        orientations[0] = ori;
        descriptors[0] = Some(desc_index);
        Self {
            x,
            y,
            sigma,
            num_descs: 1,
            orientations,
            descriptors,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CoreError {
    DescriptorIndexOutOfRange { index: usize, len: usize },
    TooManyOrientations { count: usize },
    MissingDescriptorIndex { slot: usize },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::DescriptorIndexOutOfRange { index, len } => {
                write!(f, "Descriptor index {} out of range (buffer holds {})", index, len)
            }
            CoreError::TooManyOrientations { count } => {
                write!(f, "Feature claims {} orientations (maximum {})", count, ORIENTATION_MAX_COUNT)
            }
            CoreError::MissingDescriptorIndex { slot } => {
                write!(f, "Orientation slot {} is populated but has no descriptor index", slot)
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Owning aggregate of all features and descriptors from one detection run.
///
/// The feature and descriptor buffers are independent contiguous
/// containers; features reference descriptors by index into the same
/// set. There is no reverse lookup from a descriptor slot to its owning
/// feature except by brute-force scan.
///
/// Deliberately not `Clone`: duplicating a set would silently alias the
/// descriptor indices of two containers. Sets are moved, never copied.
#[derive(Debug, Default)]
pub struct FeatureSet {
    features: Vec<Feature>,
    descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Look up the descriptor for one of a feature's orientation slots
    pub fn descriptor_for(&self, feature: &Feature, slot: usize) -> Option<&Descriptor> {
        feature
            .descriptors
            .get(slot)
            .copied()
            .flatten()
            .and_then(|i| self.descriptors.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

/// Append-only construction side of [`FeatureSet`].
///
/// Descriptors are pushed first and referenced by the returned index;
/// features are validated against the current descriptor buffer at push
/// time, so a finished set can never hold a dangling index.
#[derive(Debug, Default)]
pub struct FeatureSetBuilder {
    set: FeatureSet,
}

impl FeatureSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor and return its index in the buffer
    pub fn push_descriptor(&mut self, descriptor: Descriptor) -> usize {
        self.set.descriptors.push(descriptor);
        self.set.descriptors.len() - 1
    }

    /// Append a feature, validating its descriptor indices
    pub fn push_feature(&mut self, feature: Feature) -> CoreResult<()> {
        if feature.num_descs > ORIENTATION_MAX_COUNT {
            return Err(CoreError::TooManyOrientations { count: feature.num_descs });
        }
        for slot in 0..feature.num_descs {
            match feature.descriptors[slot] {
                Some(index) if index >= self.set.descriptors.len() => {
                    return Err(CoreError::DescriptorIndexOutOfRange {
                        index,
                        len: self.set.descriptors.len(),
                    });
                }
                Some(_) => {}
                None => return Err(CoreError::MissingDescriptorIndex { slot }),
            }
        }
        self.set.features.push(feature);
        Ok(())
    }

    /// Hand over the fully populated, read-only set
    pub fn finish(self) -> FeatureSet {
        self.set
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
