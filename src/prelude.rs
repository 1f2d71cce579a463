//! Tiny prelude imported by most modules via `use crate::prelude::*`.

#[allow(unused_imports)]
pub(crate) use anyhow::{Context as _, Result, anyhow, bail};
#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, trace, warn};
