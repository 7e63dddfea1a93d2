#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use rand::Rng;

use stego_ledger::ledger::MemoryLedger;
use stego_ledger::processing::LsbEmbedder;
use stego_ledger::protocol::ProtocolContext;

/// Random-noise PNG cover.
pub fn cover_png(width: u32, height: u32) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let img = RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]));
    encode_png(&img)
}

/// All-black PNG: every LSB is zero, so nothing reads as hidden.
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    encode_png(&RgbImage::new(width, height))
}

fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn memory_context() -> (ProtocolContext, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    let ctx = ProtocolContext::new(Arc::new(LsbEmbedder::new()), ledger.clone());
    (ctx, ledger)
}
