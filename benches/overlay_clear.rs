//! Benchmarks for overlay region maintenance
//!
//! Measures clearing and redrawing on a plane already split into many regions,
//! the pattern produced by menus that redraw button highlights.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use discnav_overlay::{
    OverlayCommand, OverlayCompositor, OverlayImage, PalettePixels, Plane, Rect, YcbcrEntry,
};

const PLANE_WIDTH: u32 = 1920;
const PLANE_HEIGHT: u32 = 1080;

fn palette() -> Vec<YcbcrEntry> {
    (0..=255u8)
        .map(|i| YcbcrEntry {
            y: i,
            cb: 128,
            cr: 128,
            alpha: 0xFF,
        })
        .collect()
}

fn draw_command(rect: Rect) -> OverlayCommand {
    let pixels = (0..rect.area()).map(|i| (i % 256) as u8).collect();
    OverlayCommand::Draw {
        plane: Plane::Interactive,
        rect,
        image: OverlayImage::Palette {
            pixels: PalettePixels::Indexed(pixels),
            palette: palette(),
        },
    }
}

/// Compositor with a `cols` x `rows` grid of button tiles.
fn button_grid(cols: u32, rows: u32) -> OverlayCompositor {
    let mut compositor = OverlayCompositor::new();
    compositor.init(Plane::Interactive, PLANE_WIDTH, PLANE_HEIGHT);
    let (w, h) = (PLANE_WIDTH / cols, PLANE_HEIGHT / rows);
    for row in 0..rows {
        for col in 0..cols {
            compositor
                .apply(draw_command(Rect::new(col * w, row * h, w, h)))
                .unwrap();
        }
    }
    compositor
}

fn bench_clear(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_clear");

    for (cols, rows) in [(4, 4), (8, 8), (16, 16)] {
        let cut = Rect::new(PLANE_WIDTH / 3, PLANE_HEIGHT / 3, PLANE_WIDTH / 3, PLANE_HEIGHT / 3);
        group.throughput(Throughput::Elements(u64::from(cols * rows)));
        group.bench_with_input(
            BenchmarkId::new("center_cut", cols * rows),
            &cut,
            |b, cut| {
                b.iter_batched(
                    || button_grid(cols, rows),
                    |mut compositor| {
                        compositor.clear(Plane::Interactive, black_box(*cut));
                        compositor
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_redraw_highlight(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay_redraw");

    let mut compositor = button_grid(8, 8);
    let highlight = Rect::new(240, 135, 240, 135);
    let command = draw_command(highlight);

    group.bench_function("button_highlight", |b| {
        b.iter(|| {
            compositor.apply(black_box(command.clone())).unwrap();
            compositor.flush(Plane::Interactive, 90_000)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_clear, bench_redraw_highlight);
criterion_main!(benches);
