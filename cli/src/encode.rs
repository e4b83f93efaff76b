use clap::Args;
use eyre::Result;
use lttb::{DownsamplerFn, Encoding};
use tokio::io::AsyncWriteExt;

use crate::downsample::process;
use crate::io::{sources, Input, Output};

#[derive(Args, Debug)]
pub struct Opts {
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

pub async fn encode(opts: &Opts) -> Result<()> {
    let mut output = Output::from_filename(&opts.output).await?;
    let passthrough: DownsamplerFn = DownsamplerFn::none();

    for source in sources(&opts.files) {
        let mut input = Input::from_filename(&source).await?;
        process(&source, &mut input, opts.from, opts.to, &passthrough, 0, &mut output).await?;
    }

    output.shutdown().await?;
    Ok(())
}
