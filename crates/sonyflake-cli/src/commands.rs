use std::io::Write;
use std::thread::scope;
use std::time::Instant;

use anyhow::{Context, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sonyflake::{LockSonyflakeGenerator, Parts, Settings, SonyflakeId};

/// Decomposition of an ID as printed by `decode --json`.
#[derive(Debug, Serialize)]
struct Decoded {
    #[serde(flatten)]
    parts: Parts,
    timestamp: String,
}

/// Mints `count` IDs on one generator shared by `threads` threads and writes
/// them to `out`, one per line, in ascending order.
pub fn generate(
    settings: Settings,
    count: usize,
    threads: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let generator = LockSonyflakeGenerator::from_settings(settings)?;
    let started = Instant::now();

    let batches = scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let share = count / threads + usize::from(i < count % threads);
                let generator = &generator;
                s.spawn(move || {
                    (0..share)
                        .map(|_| generator.next_id())
                        .collect::<sonyflake::Result<Vec<_>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow!("generator thread panicked")))
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let mut ids = Vec::with_capacity(count);
    for batch in batches {
        ids.extend(batch?);
    }
    ids.sort_unstable();

    tracing::info!(
        count,
        threads,
        machine_id = settings.machine_id(),
        elapsed = ?started.elapsed(),
        "generated ids"
    );

    for id in ids {
        writeln!(out, "{id}")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the fields of each decimal ID in `raw_ids` to `out`, as text or as
/// one JSON object per line.
pub fn decode(
    settings: Settings,
    raw_ids: &[String],
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for raw in raw_ids {
        let value: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{raw} is not a decimal id"))?;
        let id = SonyflakeId::try_from(value)?;
        let minted_at = settings
            .checked_timestamp(id)
            .ok_or_else(|| anyhow!("timestamp of {id} is out of range"))?;
        let decoded = Decoded {
            parts: id.decompose(),
            timestamp: DateTime::<Utc>::from(minted_at).to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        if json {
            serde_json::to_writer(&mut *out, &decoded)?;
            writeln!(out)?;
        } else {
            writeln!(
                out,
                "id={} timestamp={} elapsed_ticks={} sequence={} machine_id={}",
                decoded.parts.id,
                decoded.timestamp,
                decoded.parts.elapsed_ticks,
                decoded.parts.sequence,
                decoded.parts.machine_id,
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonyflake::CUSTOM_EPOCH;

    fn lines(out: &[u8]) -> Vec<String> {
        String::from_utf8(out.to_vec())
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn generate_prints_ascending_ids() {
        let settings = Settings::new(CUSTOM_EPOCH).with_machine_id(12).unwrap();
        let mut out = Vec::new();
        generate(settings, 600, 3, &mut out).unwrap();

        let ids: Vec<SonyflakeId> = lines(&out)
            .iter()
            .map(|line| SonyflakeId::try_from(line.parse::<u64>().unwrap()).unwrap())
            .collect();
        assert_eq!(ids.len(), 600);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(ids.iter().all(|id| id.machine_id() == 12));
    }

    #[test]
    fn generate_handles_more_threads_than_ids() {
        let mut out = Vec::new();
        generate(Settings::new(CUSTOM_EPOCH), 2, 4, &mut out).unwrap();
        assert_eq!(lines(&out).len(), 2);
    }

    #[test]
    fn decode_text() {
        let id = SonyflakeId::from(100, 7, 2);
        let mut out = Vec::new();
        decode(Settings::new(CUSTOM_EPOCH), &[id.to_string()], false, &mut out).unwrap();

        assert_eq!(
            lines(&out),
            [format!(
                "id={} timestamp=2025-01-01T00:00:01.000Z elapsed_ticks=100 sequence=2 machine_id=7",
                id.to_raw()
            )]
        );
    }

    #[test]
    fn decode_json() {
        let id = SonyflakeId::from(100, 7, 2);
        let mut out = Vec::new();
        decode(Settings::new(CUSTOM_EPOCH), &[id.to_string()], true, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["id"], id.to_raw());
        assert_eq!(value["msb"], 0);
        assert_eq!(value["elapsed_ticks"], 100);
        assert_eq!(value["sequence"], 2);
        assert_eq!(value["machine_id"], 7);
        assert_eq!(value["timestamp"], "2025-01-01T00:00:01.000Z");
    }

    #[test]
    fn decode_rejects_invalid_ids() {
        let settings = Settings::new(CUSTOM_EPOCH);
        let mut out = Vec::new();
        assert!(decode(settings, &["abc".into()], false, &mut out).is_err());
        assert!(decode(settings, &[u64::MAX.to_string()], false, &mut out).is_err());
    }
}
