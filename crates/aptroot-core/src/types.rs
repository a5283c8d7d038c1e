pub use aptroot_schema::{
    ARCHIVE_SUFFIX, BuildpackConfig, EnvBinding, PackageName, Requirement, RequirementError,
};
