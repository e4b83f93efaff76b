use clap::Args;
use eyre::{Result, WrapErr};
use lttb::{is_sorted, Downsampler, Encoding, Method};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use crate::io::{detect_encoding, sources, Input, Output};

#[derive(Args, Debug)]
pub struct Opts {
    /// Target number of points per series
    #[clap(long, short = 't', env = "LTTB_THRESHOLD", default_value_t = 1000)]
    pub threshold: usize,

    /// Downsampling method (lttb, none)
    #[clap(long, default_value = "lttb")]
    pub method: Method,

    /// Input encoding (json, csv) [default: detected]
    #[clap(long)]
    pub from: Option<Encoding>,

    /// Output encoding (json, csv)
    #[clap(long, default_value = "json")]
    pub to: Encoding,

    /// Output file [default: stdout]
    #[clap(long, default_value = "stdout")]
    pub output: String,

    /// Input files [default: stdin]
    pub files: Vec<String>,
}

pub async fn downsample(opts: &Opts) -> Result<()> {
    let downsampler = opts.method.downsampler();
    let mut output = Output::from_filename(&opts.output).await?;

    for source in sources(&opts.files) {
        let mut input = Input::from_filename(&source).await?;
        let n = process(
            &source,
            &mut input,
            opts.from,
            opts.to,
            &downsampler,
            opts.threshold,
            &mut output,
        )
        .await?;
        tracing::debug!(source = %source, series = n, method = %opts.method, "done");
    }

    output.shutdown().await?;
    Ok(())
}

/// Decodes every series in `input`, downsamples it and encodes the result to
/// `output`. Returns the number of series processed.
pub async fn process<R, W, D>(
    source: &str,
    input: &mut R,
    from: Option<Encoding>,
    to: Encoding,
    downsampler: &D,
    threshold: usize,
    output: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
    D: Downsampler + ?Sized,
{
    let Some(encoding) = detect_encoding(&mut *input, from).await? else {
        tracing::debug!(source = %source, "empty input");
        return Ok(0);
    };

    let mut count = 0;
    while let Some(series) = encoding
        .decode(&mut *input)
        .await
        .wrap_err_with(|| format!("decoding {} series #{}", source, count + 1))?
    {
        count += 1;
        if !is_sorted(&series) {
            tracing::warn!(
                source = %source,
                series = count,
                "timestamps are not sorted, downsampling may pick odd points"
            );
        }
        let sampled = downsampler.downsample(&series, threshold);
        tracing::debug!(
            source = %source,
            series = count,
            input = series.len(),
            output = sampled.len(),
            "downsampled"
        );
        to.encode(&mut *output, &sampled).await?;
    }

    Ok(count)
}
