use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eeprom_core::prelude::*;

const PORT: u32 = 0x20_0001;
const SCL: u8 = 0x02;
const SDA: u8 = 0x01;

fn push_byte(writes: &mut Vec<u8>, byte: u8) {
    for i in (0..8).rev() {
        let sda = if (byte >> i) & 0x01 == 0x01 { SDA } else { 0 };
        writes.extend([sda, SCL | sda, sda]);
    }
    // Release SDA for the acknowledge clock
    writes.extend([SDA, SCL | SDA, SDA]);
}

/// Bus writes for a Sega board page write: START, address, `len` data bytes, STOP.
fn page_write(addr: u8, len: u8) -> Vec<u8> {
    let mut writes = vec![SDA, SCL | SDA, SCL, 0x00];
    push_byte(&mut writes, addr << 1);
    for data in 0..len {
        push_byte(&mut writes, data);
    }
    writes.extend([0x00, SCL, SCL | SDA]);
    writes
}

fn benchmark_bus_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("eeprom");
    let writes = page_write(0x10, 16);
    let entry = ChipDatabase::global()
        .lookup(b"T-12046", 0)
        .expect("valid game");
    let mut eeprom = Eeprom::with_profile(entry.profile);
    group.bench_function("page_write", |b| {
        b.iter(|| {
            for &val in &writes {
                eeprom.write_u8(PORT, black_box(val));
            }
            black_box(eeprom.read_u8(PORT))
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_bus_write);
criterion_main!(benches);
