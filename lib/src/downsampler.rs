use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::{Lttb, Sample};

/// Downsampler reduces a series to a target number of samples.
pub trait Downsampler: Send + Sync {
    fn downsample<'a>(&self, series: &'a [Sample], threshold: usize) -> Cow<'a, [Sample]>;
}

impl<D: Downsampler + ?Sized> Downsampler for &D {
    fn downsample<'a>(&self, series: &'a [Sample], threshold: usize) -> Cow<'a, [Sample]> {
        (**self).downsample(series, threshold)
    }
}

impl<D: Downsampler + ?Sized> Downsampler for Box<D> {
    fn downsample<'a>(&self, series: &'a [Sample], threshold: usize) -> Cow<'a, [Sample]> {
        (**self).downsample(series, threshold)
    }
}

/// The signature of a plain downsampling function, such as [`crate::downsample`].
pub type DownsampleFn = for<'a> fn(&'a [Sample], usize) -> Cow<'a, [Sample]>;

/// DownsamplerFn adapts a function into a [`Downsampler`].
///
/// An adapter without a function passes series through untouched.
#[derive(Clone, Copy)]
pub struct DownsamplerFn<F = DownsampleFn>(Option<F>);

impl<F> DownsamplerFn<F>
where
    F: for<'a> Fn(&'a [Sample], usize) -> Cow<'a, [Sample]>,
{
    pub fn new(f: F) -> Self {
        DownsamplerFn(Some(f))
    }
}

impl<F> DownsamplerFn<F> {
    pub const fn none() -> Self {
        DownsamplerFn(None)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }
}

impl<F> Default for DownsamplerFn<F> {
    fn default() -> Self {
        Self::none()
    }
}

impl<F> From<Option<F>> for DownsamplerFn<F> {
    fn from(f: Option<F>) -> Self {
        DownsamplerFn(f)
    }
}

impl<F> fmt::Debug for DownsamplerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DownsamplerFn")
            .field(&if self.0.is_some() { "Some(..)" } else { "None" })
            .finish()
    }
}

impl<F> Downsampler for DownsamplerFn<F>
where
    F: for<'a> Fn(&'a [Sample], usize) -> Cow<'a, [Sample]> + Send + Sync,
{
    fn downsample<'a>(&self, series: &'a [Sample], threshold: usize) -> Cow<'a, [Sample]> {
        match &self.0 {
            Some(f) => f(series, threshold),
            None => Cow::Borrowed(series),
        }
    }
}

/// Method names a downsampling strategy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    #[default]
    Lttb,
    None,
}

impl Method {
    pub fn downsampler(self) -> Box<dyn Downsampler> {
        match self {
            Method::Lttb => Box::new(Lttb),
            Method::None => Box::new(DownsamplerFn::<DownsampleFn>::none()),
        }
    }
}

impl FromStr for Method {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lttb" => Ok(Method::Lttb),
            "none" | "identity" => Ok(Method::None),
            other => eyre::bail!("unknown downsampling method: {}", other),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Lttb => "lttb",
            Method::None => "none",
        })
    }
}
