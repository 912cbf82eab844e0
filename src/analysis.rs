use crate::stats::{Accumulator, COLUMNS, DayRecord};
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Per-day, per-column statistics across independent runs.
pub struct Analyzer {
    acc_vec: Vec<[Accumulator; 6]>,
    n_runs: usize,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            acc_vec: Vec::new(),
            n_runs: 0,
        }
    }

    /// Add the records of one run read from its results table.
    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let mut reader =
            csv::Reader::from_path(file).with_context(|| format!("failed to open {file:?}"))?;

        let mut record_vec = Vec::new();
        for result in reader.deserialize() {
            let record: DayRecord = result.context("failed to deserialize record")?;
            record_vec.push(record);
        }

        self.add_records(&record_vec)
    }

    pub fn add_records(&mut self, record_vec: &[DayRecord]) -> Result<()> {
        if self.n_runs > 0 && record_vec.len() != self.acc_vec.len() {
            bail!(
                "run has {} days, but previous runs have {}",
                record_vec.len(),
                self.acc_vec.len()
            );
        }
        for (day, record) in record_vec.iter().enumerate() {
            if record.day != day {
                bail!("expected record of day {day}, but found day {}", record.day);
            }
        }

        if self.n_runs == 0 {
            self.acc_vec.clear();
            self.acc_vec
                .resize_with(record_vec.len(), || std::array::from_fn(|_| Accumulator::new()));
        }

        for (record, acc_arr) in record_vec.iter().zip(&mut self.acc_vec) {
            for (acc, val) in acc_arr.iter_mut().zip(record.values()) {
                acc.add(val as f64);
            }
        }

        self.n_runs += 1;

        Ok(())
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Write `day` followed by the mean and standard deviation of every column.
    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let mut writer =
            csv::Writer::from_path(file).with_context(|| format!("failed to create {file:?}"))?;

        let mut header = vec!["day".to_string()];
        for col in COLUMNS {
            header.push(format!("{col}_mean"));
            header.push(format!("{col}_std_dev"));
        }
        writer.write_record(&header).context("failed to write header")?;

        for (day, acc_arr) in self.acc_vec.iter().enumerate() {
            let mut row = vec![day.to_string()];
            for acc in acc_arr {
                let report = acc.report();
                row.push(report.mean.to_string());
                row.push(report.std_dev.to_string());
            }
            writer.write_record(&row).context("failed to write row")?;
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }
}
