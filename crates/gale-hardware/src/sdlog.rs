//! CSV audit trail on SD card.
//!
//! The control loop hands records to a bounded channel through
//! [`SdCsvSink`] and never waits on storage. A dedicated task owns the
//! SPI card, appends rows to the log file and flushes periodically. Any
//! storage failure downgrades the task to draining the channel so the
//! controller keeps running.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::{Mode, SdCard, TimeSource, Timestamp, VolumeIdx, VolumeManager};
use thiserror::Error;

use defmt::{info, warn};
use gale_config::{LOG_CHANNEL_DEPTH, LOG_FILE_NAME, LOG_FLUSH_EVERY};
use gale_control::capability::RecordSink;
use gale_control::record::{CSV_HEADER, LogRecord};

static LOG_CHANNEL: Channel<CriticalSectionRawMutex, LogRecord, LOG_CHANNEL_DEPTH> = Channel::new();

/// Sink handed to the controller. Rows are dropped when the writer falls
/// behind; the audit trail is best-effort by contract.
pub struct SdCsvSink;

impl RecordSink for SdCsvSink {
    fn record(&mut self, record: &LogRecord) {
        let _ = LOG_CHANNEL.try_send(*record);
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SdLogError {
    #[error("SPI device setup failed")]
    Spi,

    #[error("no FAT volume found")]
    Volume,

    #[error("log file could not be opened")]
    File,
}

/// FAT timestamps are not meaningful without wall-clock time; rows carry
/// their own monotonic timestamps instead.
struct NullTimeSource;

impl TimeSource for NullTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 0,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

#[embassy_executor::task]
pub async fn sd_logger_task(spi: Spi<'static, SPI0, Blocking>, cs: Output<'static>) {
    if let Err(e) = run(spi, cs).await {
        warn!("sd: logger disabled: {}", e);
        loop {
            let _ = LOG_CHANNEL.receive().await;
        }
    }
}

async fn run(spi: Spi<'static, SPI0, Blocking>, cs: Output<'static>) -> Result<(), SdLogError> {
    let device = ExclusiveDevice::new(spi, cs, Delay).map_err(|_| SdLogError::Spi)?;
    let sdcard = SdCard::new(device, Delay);

    let mut volume_mgr = VolumeManager::new(sdcard, NullTimeSource);
    let mut volume = volume_mgr
        .open_volume(VolumeIdx(0))
        .map_err(|_| SdLogError::Volume)?;
    let mut root = volume.open_root_dir().map_err(|_| SdLogError::Volume)?;
    let mut file = root
        .open_file_in_dir(LOG_FILE_NAME, Mode::ReadWriteCreateOrAppend)
        .map_err(|_| SdLogError::File)?;

    // Fresh file: write the canonical header once.
    if file.length() == 0 {
        file.write(CSV_HEADER.as_bytes())
            .and_then(|()| file.write(b"\n"))
            .map_err(|_| SdLogError::File)?;
    }

    info!("sd: logging to {}", LOG_FILE_NAME);

    let mut rows_since_flush = 0u32;
    loop {
        let record = LOG_CHANNEL.receive().await;
        let row = record.to_csv_row();

        if file.write(row.as_bytes()).is_err() {
            warn!("sd: row write failed, dropping record");
            continue;
        }

        rows_since_flush += 1;
        if rows_since_flush >= LOG_FLUSH_EVERY {
            if file.flush().is_err() {
                warn!("sd: flush failed");
            }
            rows_since_flush = 0;
        }
    }
}
