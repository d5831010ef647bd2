// Every error the crate can produce lives under here, one enum per
// layer. We do not allow string errors. This is RUST damn it!

pub mod disk;
pub mod filesystem;
