#![allow(dead_code)]

pub mod hex;
pub mod htp_server;
pub mod solver;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{Context, Error, anyhow};
        pub type Result<T> = anyhow::Result<T, Error>;

        pub use std::collections::{BTreeSet, HashMap, HashSet};
    }
}

pub mod prelude {
    pub use super::hex::prelude::*;
    pub use super::htp_server::*;
    pub use super::solver::*;
    pub use super::utils::prelude::*;
}
