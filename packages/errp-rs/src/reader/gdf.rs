// GDF (General Data Format for biosignals) reader/writer
// Covers GDF 1.x and 2.x fixed and variable headers, all integer and float
// sample types, and the event table (modes 1 and 3).

use super::{SignalMetadata, SignalReader};
use crate::error::{ErrpError, Result};
use crate::mmap_utils::mmap_file;
use crate::recording::Recording;
use crate::types::{seconds_to_samples, Annotation};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use memmap2::Mmap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

const FIXED_HEADER_BYTES: usize = 256;
const SIGNAL_HEADER_BYTES: usize = 256;

/// MATLAB datenum of 1970-01-01
const DATENUM_UNIX_EPOCH: f64 = 719_529.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Physical dimension code for volts; SI prefixes are added to it
const DIMENSION_CODE_VOLT: u16 = 4256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdfDataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl GdfDataType {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Int8),
            2 => Some(Self::UInt8),
            3 => Some(Self::Int16),
            4 => Some(Self::UInt16),
            5 => Some(Self::Int32),
            6 => Some(Self::UInt32),
            7 => Some(Self::Int64),
            8 => Some(Self::UInt64),
            16 => Some(Self::Float32),
            17 => Some(Self::Float64),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Int8 => 1,
            Self::UInt8 => 2,
            Self::Int16 => 3,
            Self::UInt16 => 4,
            Self::Int32 => 5,
            Self::UInt32 => 6,
            Self::Int64 => 7,
            Self::UInt64 => 8,
            Self::Float32 => 16,
            Self::Float64 => 17,
        }
    }

    /// Bytes per sample
    pub fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Decode one little-endian sample
    #[inline]
    fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            Self::Int8 => bytes[0] as i8 as f64,
            Self::UInt8 => bytes[0] as f64,
            Self::Int16 => LittleEndian::read_i16(bytes) as f64,
            Self::UInt16 => LittleEndian::read_u16(bytes) as f64,
            Self::Int32 => LittleEndian::read_i32(bytes) as f64,
            Self::UInt32 => LittleEndian::read_u32(bytes) as f64,
            Self::Int64 => LittleEndian::read_i64(bytes) as f64,
            Self::UInt64 => LittleEndian::read_u64(bytes) as f64,
            Self::Float32 => LittleEndian::read_f32(bytes) as f64,
            Self::Float64 => LittleEndian::read_f64(bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GdfHeader {
    pub version: String,              // 8 bytes: "GDF 1.25", "GDF 2.20", ...
    pub patient_id: String,           // 80 bytes (1.x) / 66 bytes (2.x)
    pub recording_id: String,         // 80 bytes (1.x) / 64 bytes (2.x)
    pub start_time: Option<DateTime<Utc>>,
    pub header_bytes: usize,          // total header length including signal headers
    pub num_data_records: usize,
    pub duration_of_data_record: f64, // seconds, stored as numerator/denominator
    pub num_signals: usize,
}

impl GdfHeader {
    /// Numeric part of the version string (1.25, 2.20, ...)
    pub fn version_number(&self) -> f64 {
        self.version
            .trim_start_matches("GDF")
            .trim()
            .parse()
            .unwrap_or(0.0)
    }

    pub fn is_v2(&self) -> bool {
        self.version_number() >= 1.9
    }
}

#[derive(Debug, Clone)]
pub struct GdfSignalHeader {
    pub label: String,              // 16 bytes
    pub transducer_type: String,    // 80 bytes
    pub physical_dimension: String, // 8 bytes (1.x) / 6 bytes (2.x)
    pub physical_dimension_code: u16,
    pub physical_minimum: f64,
    pub physical_maximum: f64,
    pub digital_minimum: f64,
    pub digital_maximum: f64,
    /// Filter cutoffs in Hz (2.x only)
    pub lowpass: Option<f64>,
    pub highpass: Option<f64>,
    pub notch: Option<f64>,
    pub num_samples_per_record: usize,
    pub data_type: GdfDataType,
}

impl GdfSignalHeader {
    pub fn sample_frequency(&self, record_duration: f64) -> f64 {
        self.num_samples_per_record as f64 / record_duration
    }

    pub fn gain(&self) -> f64 {
        let digital_range = self.digital_maximum - self.digital_minimum;
        if digital_range == 0.0 {
            1.0
        } else {
            (self.physical_maximum - self.physical_minimum) / digital_range
        }
    }

    pub fn offset(&self) -> f64 {
        self.physical_minimum - self.gain() * self.digital_minimum
    }

    /// Factor converting the stored physical unit to volts (1 for non-voltage channels)
    pub fn volt_scale(&self) -> f64 {
        match self.physical_dimension.trim() {
            "uV" | "µV" | "μV" => 1e-6,
            "mV" => 1e-3,
            "nV" => 1e-9,
            "V" => 1.0,
            "" => match self.physical_dimension_code {
                c if c == DIMENSION_CODE_VOLT + 18 => 1e-3,
                c if c == DIMENSION_CODE_VOLT + 19 => 1e-6,
                c if c == DIMENSION_CODE_VOLT + 20 => 1e-9,
                _ => 1.0,
            },
            _ => 1.0,
        }
    }
}

/// One entry of the GDF event table
#[derive(Debug, Clone, PartialEq)]
pub struct GdfEvent {
    /// 1-based sample position at the event table rate
    pub position: u32,
    pub type_code: u16,
    pub channel: u16,
    pub duration: u32,
}

pub struct GdfReader {
    mmap: Mmap,
    path: PathBuf,
    pub header: GdfHeader,
    pub signal_headers: Vec<GdfSignalHeader>,
    record_bytes: usize,
    /// Byte offset of each signal inside one data record
    signal_offsets: Vec<usize>,
    events: Vec<GdfEvent>,
    event_rate: f64,
}

fn fixed_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

fn u24(bytes: &[u8]) -> u32 {
    bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
}

fn truncated(what: &str) -> ErrpError {
    ErrpError::InvalidFormat(format!("GDF file truncated while reading {}", what))
}

fn parse_v1_start_time(field: &str) -> Option<DateTime<Utc>> {
    let digits = field.get(..14)?;
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn datenum_to_datetime(raw: u64) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    let days = raw as f64 / 2f64.powi(32);
    let unix_seconds = (days - DATENUM_UNIX_EPOCH) * SECONDS_PER_DAY;
    let secs = unix_seconds.floor();
    let nanos = ((unix_seconds - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
}

fn datetime_to_datenum(time: DateTime<Utc>) -> u64 {
    let unix_seconds = time.timestamp() as f64 + time.timestamp_subsec_nanos() as f64 * 1e-9;
    let days = unix_seconds / SECONDS_PER_DAY + DATENUM_UNIX_EPOCH;
    (days * 2f64.powi(32)).round() as u64
}

impl GdfReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ErrpError::FileNotFound(path.display().to_string()));
        }
        let mmap = mmap_file(path)?;

        let header = Self::read_header(&mmap)?;
        let signal_headers = Self::read_signal_headers(&mmap, &header)?;

        let mut signal_offsets = Vec::with_capacity(signal_headers.len());
        let mut record_bytes = 0;
        for sh in &signal_headers {
            signal_offsets.push(record_bytes);
            record_bytes += sh.num_samples_per_record * sh.data_type.size();
        }

        let data_end = header.header_bytes + header.num_data_records * record_bytes;
        if mmap.len() < data_end {
            return Err(truncated("data records"));
        }

        let signal_rate = signal_headers
            .first()
            .map(|sh| sh.sample_frequency(header.duration_of_data_record))
            .unwrap_or(0.0);
        let (events, event_rate) = Self::read_events(&mmap[data_end..], &header, signal_rate)?;

        log::debug!(
            "GDF parsed: version={}, signals={}, records={}, record_duration={}, events={}",
            header.version,
            header.num_signals,
            header.num_data_records,
            header.duration_of_data_record,
            events.len()
        );

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
            header,
            signal_headers,
            record_bytes,
            signal_offsets,
            events,
            event_rate,
        })
    }

    fn read_header(bytes: &[u8]) -> Result<GdfHeader> {
        if bytes.len() < FIXED_HEADER_BYTES {
            return Err(truncated("fixed header"));
        }

        let version = fixed_string(&bytes[0..8]);
        if !version.starts_with("GDF") {
            return Err(ErrpError::InvalidFormat(format!(
                "Not a GDF file (version field '{}')",
                version
            )));
        }

        let mut header = GdfHeader {
            version,
            patient_id: String::new(),
            recording_id: String::new(),
            start_time: None,
            header_bytes: 0,
            num_data_records: 0,
            duration_of_data_record: 0.0,
            num_signals: 0,
        };

        if header.is_v2() {
            header.patient_id = fixed_string(&bytes[8..74]);
            header.recording_id = fixed_string(&bytes[88..152]);
            header.start_time = datenum_to_datetime(LittleEndian::read_u64(&bytes[168..176]));
            header.header_bytes = LittleEndian::read_u16(&bytes[184..186]) as usize * 256;
            header.num_signals = LittleEndian::read_u16(&bytes[252..254]) as usize;
        } else {
            header.patient_id = fixed_string(&bytes[8..88]);
            header.recording_id = fixed_string(&bytes[88..168]);
            header.start_time = parse_v1_start_time(&fixed_string(&bytes[168..184]));
            let header_bytes = LittleEndian::read_i64(&bytes[184..192]);
            if header_bytes < 0 {
                return Err(ErrpError::InvalidFormat(format!(
                    "Negative header length {}",
                    header_bytes
                )));
            }
            header.header_bytes = header_bytes as usize;
            header.num_signals = LittleEndian::read_u32(&bytes[252..256]) as usize;
        }

        let num_records = LittleEndian::read_i64(&bytes[236..244]);
        if num_records < 0 {
            return Err(ErrpError::InvalidFormat(
                "Unknown number of data records is not supported".to_string(),
            ));
        }
        header.num_data_records = num_records as usize;

        let numerator = LittleEndian::read_u32(&bytes[244..248]);
        let denominator = LittleEndian::read_u32(&bytes[248..252]);
        if numerator == 0 || denominator == 0 {
            return Err(ErrpError::InvalidFormat(format!(
                "Invalid record duration {}/{}",
                numerator, denominator
            )));
        }
        header.duration_of_data_record = numerator as f64 / denominator as f64;

        let expected = FIXED_HEADER_BYTES + header.num_signals * SIGNAL_HEADER_BYTES;
        if header.header_bytes < expected {
            return Err(ErrpError::InvalidFormat(format!(
                "Header length {} too small for {} signals",
                header.header_bytes, header.num_signals
            )));
        }

        Ok(header)
    }

    fn read_signal_headers(bytes: &[u8], header: &GdfHeader) -> Result<Vec<GdfSignalHeader>> {
        let ns = header.num_signals;
        if bytes.len() < FIXED_HEADER_BYTES + ns * SIGNAL_HEADER_BYTES {
            return Err(truncated("signal headers"));
        }

        // Fields are stored one block per field, each block holding all signals
        let field = |block_offset: usize, width: usize, i: usize| -> &[u8] {
            let start = FIXED_HEADER_BYTES + ns * block_offset + i * width;
            &bytes[start..start + width]
        };
        let v2 = header.is_v2();

        let mut signal_headers = Vec::with_capacity(ns);
        for i in 0..ns {
            let (physical_dimension, physical_dimension_code, digital_minimum, digital_maximum) =
                if v2 {
                    (
                        fixed_string(field(96, 6, i)),
                        LittleEndian::read_u16(field(102, 2, i)),
                        LittleEndian::read_f64(field(120, 8, i)),
                        LittleEndian::read_f64(field(128, 8, i)),
                    )
                } else {
                    (
                        fixed_string(field(96, 8, i)),
                        0,
                        LittleEndian::read_i64(field(120, 8, i)) as f64,
                        LittleEndian::read_i64(field(128, 8, i)) as f64,
                    )
                };
            // 2.x keeps the 1.x prefilter area as 68 reserved bytes plus three f32 cutoffs
            let (lowpass, highpass, notch) = if v2 {
                (
                    Some(LittleEndian::read_f32(field(204, 4, i)) as f64),
                    Some(LittleEndian::read_f32(field(208, 4, i)) as f64),
                    Some(LittleEndian::read_f32(field(212, 4, i)) as f64),
                )
            } else {
                (None, None, None)
            };

            let type_code = LittleEndian::read_u32(field(220, 4, i));
            let data_type = GdfDataType::from_code(type_code).ok_or_else(|| {
                ErrpError::InvalidFormat(format!(
                    "Unsupported GDF data type {} for signal {}",
                    type_code, i
                ))
            })?;

            signal_headers.push(GdfSignalHeader {
                label: fixed_string(field(0, 16, i)),
                transducer_type: fixed_string(field(16, 80, i)),
                physical_dimension,
                physical_dimension_code,
                physical_minimum: LittleEndian::read_f64(field(104, 8, i)),
                physical_maximum: LittleEndian::read_f64(field(112, 8, i)),
                digital_minimum,
                digital_maximum,
                lowpass,
                highpass,
                notch,
                num_samples_per_record: LittleEndian::read_u32(field(216, 4, i)) as usize,
                data_type,
            });
        }

        if let Some(first) = signal_headers.first() {
            if let Some(other) = signal_headers
                .iter()
                .find(|sh| sh.num_samples_per_record != first.num_samples_per_record)
            {
                return Err(ErrpError::InvalidFormat(format!(
                    "Mixed sampling rates are not supported ('{}' has {} samples per record, '{}' has {})",
                    first.label,
                    first.num_samples_per_record,
                    other.label,
                    other.num_samples_per_record
                )));
            }
        }

        Ok(signal_headers)
    }

    /// Parse the event table that follows the data records. Returns the
    /// events and the rate their positions are expressed in.
    fn read_events(
        table: &[u8],
        header: &GdfHeader,
        signal_rate: f64,
    ) -> Result<(Vec<GdfEvent>, f64)> {
        if table.len() < 8 {
            return Ok((Vec::new(), signal_rate));
        }

        let mode = table[0];
        let (num_events, rate) = if header.is_v2() {
            (
                u24(&table[1..4]) as usize,
                LittleEndian::read_f32(&table[4..8]) as f64,
            )
        } else {
            (
                LittleEndian::read_u32(&table[4..8]) as usize,
                u24(&table[1..4]) as f64,
            )
        };
        let rate = if rate > 0.0 { rate } else { signal_rate };

        let per_event = match mode {
            1 => 6,
            3 => 12,
            other => {
                return Err(ErrpError::InvalidFormat(format!(
                    "Unsupported GDF event table mode {}",
                    other
                )))
            }
        };
        if table.len() < 8 + num_events * per_event {
            return Err(truncated("event table"));
        }

        let positions = &table[8..8 + num_events * 4];
        let types = &table[8 + num_events * 4..8 + num_events * 6];
        let extended = &table[8 + num_events * 6..];

        let events = (0..num_events)
            .map(|i| {
                let (channel, duration) = if mode == 3 {
                    (
                        LittleEndian::read_u16(&extended[i * 2..]),
                        LittleEndian::read_u32(&extended[num_events * 2 + i * 4..]),
                    )
                } else {
                    (0, 0)
                };
                GdfEvent {
                    position: LittleEndian::read_u32(&positions[i * 4..]),
                    type_code: LittleEndian::read_u16(&types[i * 2..]),
                    channel,
                    duration,
                }
            })
            .collect();

        Ok((events, rate))
    }

    pub fn events(&self) -> &[GdfEvent] {
        &self.events
    }

    pub fn event_rate(&self) -> f64 {
        self.event_rate
    }

    pub fn sample_rate(&self) -> f64 {
        self.signal_headers
            .first()
            .map(|sh| sh.sample_frequency(self.header.duration_of_data_record))
            .unwrap_or(0.0)
    }

    pub fn num_samples(&self) -> usize {
        self.signal_headers
            .first()
            .map(|sh| self.header.num_data_records * sh.num_samples_per_record)
            .unwrap_or(0)
    }

    /// Physical values of one signal over `[start, stop)`, in volts
    fn read_signal(&self, signal_index: usize, start: usize, stop: usize) -> Vec<f64> {
        let sh = &self.signal_headers[signal_index];
        let spr = sh.num_samples_per_record;
        let size = sh.data_type.size();
        let gain = sh.gain();
        let offset = sh.offset();
        let scale = sh.volt_scale();
        let base = self.header.header_bytes + self.signal_offsets[signal_index];

        (start..stop)
            .map(|sample| {
                let at = base + (sample / spr) * self.record_bytes + (sample % spr) * size;
                let digital = sh.data_type.decode(&self.mmap[at..at + size]);
                (gain * digital + offset) * scale
            })
            .collect()
    }

    pub fn total_duration(&self) -> f64 {
        self.header.num_data_records as f64 * self.header.duration_of_data_record
    }
}

impl SignalReader for GdfReader {
    fn metadata(&self) -> Result<SignalMetadata> {
        Ok(SignalMetadata {
            file_path: self.path.to_string_lossy().to_string(),
            sample_rate: self.sample_rate(),
            num_channels: self.signal_headers.len(),
            num_samples: self.num_samples(),
            duration: self.total_duration(),
            channels: self.signal_headers.iter().map(|sh| sh.label.clone()).collect(),
            units: self
                .signal_headers
                .iter()
                .map(|sh| sh.physical_dimension.clone())
                .collect(),
            start_time: self.header.start_time,
            file_type: "GDF".to_string(),
        })
    }

    fn read_chunk(
        &self,
        start_sample: usize,
        num_samples: usize,
        channels: Option<&[String]>,
    ) -> Result<Vec<Vec<f64>>> {
        let channel_indices: Vec<usize> = match channels {
            Some(selected) => selected
                .iter()
                .map(|name| {
                    self.signal_headers
                        .iter()
                        .position(|sh| &sh.label == name)
                        .ok_or_else(|| ErrpError::ChannelNotFound(name.clone()))
                })
                .collect::<Result<_>>()?,
            None => (0..self.signal_headers.len()).collect(),
        };

        let stop = (start_sample + num_samples).min(self.num_samples());
        let start = start_sample.min(stop);

        Ok(channel_indices
            .into_par_iter()
            .map(|idx| self.read_signal(idx, start, stop))
            .collect())
    }

    fn annotations(&self) -> Result<Vec<Annotation>> {
        Ok(self
            .events
            .iter()
            .map(|event| Annotation {
                onset: (event.position as f64 - 1.0) / self.event_rate,
                duration: event.duration as f64 / self.event_rate,
                description: event.type_code.to_string(),
            })
            .collect())
    }

    fn format_name(&self) -> &str {
        "GDF"
    }
}

/// Writes recordings as GDF 2.20 with float64 samples in volts.
///
/// The whole recording is stored in a single data record, so the sampling
/// rate must be a whole number of Hz. Annotation descriptions must be numeric
/// event codes; they become a mode-1 event table.
#[derive(Debug, Clone, Default)]
pub struct GdfWriter {
    pub patient_id: String,
    pub recording_id: String,
}

impl GdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn put_str(buffer: &mut [u8], offset: usize, width: usize, value: &str) {
        let bytes = value.as_bytes();
        let len = bytes.len().min(width);
        buffer[offset..offset + len].copy_from_slice(&bytes[..len]);
    }

    pub fn write<P: AsRef<Path>>(&self, path: P, recording: &Recording) -> Result<()> {
        let sample_rate = recording.sample_rate();
        if sample_rate.fract() != 0.0 || sample_rate > u32::MAX as f64 {
            return Err(ErrpError::InvalidParameter(format!(
                "GDF export needs an integral sampling rate, got {}",
                sample_rate
            )));
        }
        let num_samples = recording.num_samples();
        if num_samples == 0 || num_samples > u32::MAX as usize {
            return Err(ErrpError::InvalidParameter(format!(
                "Cannot export a recording with {} samples",
                num_samples
            )));
        }
        let ns = recording.num_channels();
        if ns > u16::MAX as usize {
            return Err(ErrpError::InvalidParameter(format!("Too many channels: {}", ns)));
        }

        let events = recording
            .annotations()
            .iter()
            .map(|annotation| {
                let code = annotation.description.trim().parse::<u16>().map_err(|_| {
                    ErrpError::InvalidParameter(format!(
                        "Annotation '{}' is not a numeric GDF event code",
                        annotation.description
                    ))
                })?;
                let position = seconds_to_samples(annotation.onset, sample_rate) + 1;
                Ok((position.max(1) as u32, code))
            })
            .collect::<Result<Vec<_>>>()?;

        let header_bytes = FIXED_HEADER_BYTES + ns * SIGNAL_HEADER_BYTES;
        let mut out = vec![0u8; header_bytes];

        Self::put_str(&mut out, 0, 8, "GDF 2.20");
        Self::put_str(&mut out, 8, 66, &self.patient_id);
        Self::put_str(&mut out, 88, 64, &self.recording_id);
        let start = recording.start_time().map(datetime_to_datenum).unwrap_or(0);
        LittleEndian::write_u64(&mut out[168..176], start);
        LittleEndian::write_u16(&mut out[184..186], (header_bytes / 256) as u16);
        LittleEndian::write_i64(&mut out[236..244], 1);
        LittleEndian::write_u32(&mut out[244..248], num_samples as u32);
        LittleEndian::write_u32(&mut out[248..252], sample_rate as u32);
        LittleEndian::write_u16(&mut out[252..254], ns as u16);

        let block = |offset: usize, width: usize, i: usize| {
            let start = FIXED_HEADER_BYTES + ns * offset + i * width;
            start..start + width
        };
        for (i, label) in recording.channel_names().iter().enumerate() {
            Self::put_str(&mut out, block(0, 16, i).start, 16, label);
            Self::put_str(&mut out, block(96, 6, i).start, 6, "V");
            LittleEndian::write_u16(&mut out[block(102, 2, i)], DIMENSION_CODE_VOLT);
            LittleEndian::write_f64(&mut out[block(104, 8, i)], -1.0);
            LittleEndian::write_f64(&mut out[block(112, 8, i)], 1.0);
            LittleEndian::write_f64(&mut out[block(120, 8, i)], -1.0);
            LittleEndian::write_f64(&mut out[block(128, 8, i)], 1.0);
            LittleEndian::write_u32(&mut out[block(216, 4, i)], num_samples as u32);
            LittleEndian::write_u32(&mut out[block(220, 4, i)], GdfDataType::Float64.code());
        }

        out.reserve(ns * num_samples * 8 + 8 + events.len() * 6);
        for &value in recording.data().iter() {
            out.write_f64::<LittleEndian>(value)?;
        }

        out.write_u8(1)?;
        let count = events.len() as u32;
        out.extend_from_slice(&count.to_le_bytes()[..3]);
        out.write_f32::<LittleEndian>(sample_rate as f32)?;
        for (position, _) in &events {
            out.write_u32::<LittleEndian>(*position)?;
        }
        for (_, code) in &events {
            out.write_u16::<LittleEndian>(*code)?;
        }

        std::fs::write(path.as_ref(), out)?;
        log::info!(
            "Wrote GDF {} ({} channels, {} samples, {} events)",
            path.as_ref().display(),
            ns,
            num_samples,
            events.len()
        );
        Ok(())
    }
}
