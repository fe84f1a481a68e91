pub use anyhow::{bail, ensure, format_err, Context as _, Result};
pub use bbox::{prelude::*, CyCxHW, Transform, HW, TLBR};
pub use glob::{MatchOptions, Pattern};
pub use image::{DynamicImage, GenericImage as _, ImageError, ImageFormat};
pub use indexmap::IndexMap;
pub use itertools::{iproduct, Itertools as _};
pub use label::{Label, Pixel, PixelLabel, Ratio, RatioLabel};
pub use log::{debug, info, warn};
pub use noisy_float::prelude::*;
pub use rayon::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::{HashMap, HashSet},
    fmt, fs, io,
    num::NonZeroUsize,
    ops::AddAssign,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};
