//! Codec and checksum properties checked against independent implementations.

use std::io::{Read, Write};

use proptest::prelude::*;
use runzip::codec::{Deflater, DeflaterWriter, Framing, Inflater, InflaterReader, Level};
use runzip::{Crc32, crc32};

#[test]
fn test_standard_check_value() {
    assert_eq!(crc32(b""), 0);
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
}

#[test]
fn test_zlib_framing_round_trip() {
    let data = b"zlib framed payload ".repeat(300);
    let deflater = Deflater::new(Level::DEFAULT, Framing::Zlib);
    let mut writer = DeflaterWriter::with_deflater(Vec::new(), deflater);
    writer.write_all(&data).unwrap();
    let compressed = writer.finish().unwrap();

    // flate2's zlib decoder agrees with our framing.
    let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);

    let mut reader = InflaterReader::with_inflater(&compressed[..], Inflater::new(Framing::Zlib));
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_writer_counters() {
    let data = vec![b'z'; 10_000];
    let mut writer = DeflaterWriter::new(Vec::new(), Level::BEST);
    writer.write_all(&data).unwrap();
    writer.close().unwrap();
    assert_eq!(writer.total_in(), 10_000);
    let written = writer.get_ref().map(Vec::len).unwrap_or_default() as u64;
    assert_eq!(writer.total_out(), written);
    assert!(written < 200);
}

proptest! {
    #[test]
    fn prop_crc_matches_crc32fast(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
        prop_assert_eq!(crc32(&data), crc32fast::hash(&data));
    }

    #[test]
    fn prop_incremental_crc(data in proptest::collection::vec(any::<u8>(), 0..2048), split in 0usize..2048) {
        let split = split.min(data.len());
        let mut crc = Crc32::new();
        crc.update(&data[..split]);
        for &b in &data[split..] {
            crc.update_byte(b);
        }
        prop_assert_eq!(crc.value(), crc32fast::hash(&data));
    }

    #[test]
    fn prop_inflater_reads_flate2_output(
        data in proptest::collection::vec(any::<u8>(), 0..16_384),
        read_size in 1usize..5000,
    ) {
        let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut reader = InflaterReader::new(&compressed[..], Framing::Raw);
        let mut out = Vec::new();
        let mut buf = vec![0u8; read_size];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        prop_assert_eq!(out, data);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_runs_round_trip_through_small_reads(
        byte in any::<u8>(),
        len in 0usize..300_000,
        read_size in 1usize..512,
        level in 0u32..=9,
    ) {
        let data = vec![byte; len];
        let mut writer = DeflaterWriter::new(Vec::new(), Level::new(level));
        writer.write_all(&data).unwrap();
        let compressed = writer.finish().unwrap();

        let mut reader = InflaterReader::new(&compressed[..], Framing::Raw);
        let mut out = Vec::with_capacity(len);
        let mut buf = vec![0u8; read_size];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        prop_assert_eq!(out, data);
    }
}
