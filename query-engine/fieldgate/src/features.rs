use crate::opt::FieldgateOpt;

/// Feature toggles set up during startup, see the boolean flags of [FieldgateOpt].
#[enumflags2::bitflags]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Feature {
    /// Expand every filter operator regardless of the configured profile.
    ExtendedFilters,
    /// Reject selections the read type does not expose.
    StrictProjection,
}

/// EnabledFeatures represents a collection of the features that are enabled, masked in a byte
pub type EnabledFeatures = enumflags2::BitFlags<Feature>;

impl From<&FieldgateOpt> for EnabledFeatures {
    fn from(opts: &FieldgateOpt) -> Self {
        let mut features: EnabledFeatures = Self::default();

        if opts.extended_filters {
            features |= Feature::ExtendedFilters
        }
        if opts.strict_projection {
            features |= Feature::StrictProjection
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structopt::StructOpt;

    #[test]
    fn flags_map_to_features() {
        let opts = FieldgateOpt::from_iter_safe(["fieldgate", "--strict-projection", "types"]).unwrap();
        let features = EnabledFeatures::from(&opts);

        assert!(features.contains(Feature::StrictProjection));
        assert!(!features.contains(Feature::ExtendedFilters));
    }
}
