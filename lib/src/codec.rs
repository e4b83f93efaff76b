use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};

use crate::sample::{format_value, parse_value};
use crate::Sample;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid record {record}: {reason}")]
    InvalidRecord { record: usize, reason: String },
}

/// Codec reads and writes whole series. `decode` yields `None` once the
/// reader is exhausted.
#[async_trait]
pub trait Codec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &self,
        writer: &mut W,
        series: &[Sample],
    ) -> Result<(), CodecError>;

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Vec<Sample>>, CodecError>;
}

// JsonCodec writes one series per line as an array of `[ts, "value"]` pairs.
pub struct JsonCodec;

// Lines may also carry a range vector entry as returned by a query API.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSeries {
    Values(Vec<Sample>),
    Matrix { values: Vec<Sample> },
}

#[async_trait]
impl Codec for JsonCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &self,
        writer: &mut W,
        series: &[Sample],
    ) -> Result<(), CodecError> {
        writer.write_all(&serde_json::to_vec(series)?).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Vec<Sample>>, CodecError> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        let parsed: JsonSeries = serde_json::from_str(&line)?;
        let series = match parsed {
            JsonSeries::Values(values) | JsonSeries::Matrix { values } => values,
        };
        Ok(Some(series))
    }
}

// CsvCodec writes `timestamp_ms,value` rows, with a blank line after each series.
pub struct CsvCodec;

#[async_trait]
impl Codec for CsvCodec {
    async fn encode<W: AsyncWrite + Unpin + Send>(
        &self,
        writer: &mut W,
        series: &[Sample],
    ) -> Result<(), CodecError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for s in series {
            wtr.write_record(&[
                s.timestamp.unix_millis().to_string(),
                format_value(s.value),
            ])?;
        }
        let mut buf = wtr.into_inner().map_err(|e| e.into_error())?;
        buf.push(b'\n');
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn decode<R: AsyncBufRead + Unpin + Send>(
        &self,
        reader: &mut R,
    ) -> Result<Option<Vec<Sample>>, CodecError> {
        let mut buf = String::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            if line.trim().is_empty() {
                if buf.is_empty() {
                    continue;
                }
                break;
            }
            buf.push_str(&line);
        }
        if buf.is_empty() {
            return Ok(None);
        }
        parse_csv(buf.as_bytes()).map(Some)
    }
}

fn parse_csv(data: &[u8]) -> Result<Vec<Sample>, CodecError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut series = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let invalid = |reason: String| CodecError::InvalidRecord { record: i + 1, reason };
        if record.len() != 2 {
            return Err(invalid(format!("expected 2 fields, got {}", record.len())));
        }
        let Ok(ts) = record[0].parse::<i64>() else {
            // A leading header row is tolerated.
            if i == 0 {
                continue;
            }
            return Err(invalid(format!("bad timestamp {:?}", &record[0])));
        };
        let value = parse_value(&record[1])
            .ok_or_else(|| invalid(format!("bad value {:?}", &record[1])))?;
        series.push(Sample::new(ts, value));
    }
    Ok(series)
}

/// Encoding selects a [`Codec`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Json,
    Csv,
}

impl Encoding {
    /// Guesses the encoding from the first byte of the input.
    pub fn detect(first: u8) -> Self {
        match first {
            b'[' | b'{' => Encoding::Json,
            _ => Encoding::Csv,
        }
    }

    pub async fn encode<W: AsyncWrite + Unpin + Send>(
        self,
        writer: &mut W,
        series: &[Sample],
    ) -> Result<(), CodecError> {
        match self {
            Encoding::Json => JsonCodec.encode(writer, series).await,
            Encoding::Csv => CsvCodec.encode(writer, series).await,
        }
    }

    pub async fn decode<R: AsyncBufRead + Unpin + Send>(
        self,
        reader: &mut R,
    ) -> Result<Option<Vec<Sample>>, CodecError> {
        match self {
            Encoding::Json => JsonCodec.decode(reader).await,
            Encoding::Csv => CsvCodec.decode(reader).await,
        }
    }
}

impl FromStr for Encoding {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Encoding::Json),
            "csv" => Ok(Encoding::Csv),
            other => eyre::bail!("unknown encoding: {}", other),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Json => "json",
            Encoding::Csv => "csv",
        })
    }
}
