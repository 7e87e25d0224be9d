use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lightplot_core::{Event, EventChannel};

#[derive(Debug)]
struct Moved {
    x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MovedKind;

impl Event for Moved {
    type Kind = MovedKind;
    fn kind(&self) -> MovedKind {
        MovedKind
    }
}

fn bench_emit_fanout(c: &mut Criterion) {
    let channel = EventChannel::<Moved>::new("bench");
    for _ in 0..16 {
        channel.on(MovedKind, |event| {
            black_box(event.x);
        });
    }

    c.bench_function("emit_16_listeners", |b| {
        b.iter(|| channel.emit(black_box(&Moved { x: 1.0 })))
    });
}

fn bench_scoped_cycle(c: &mut Criterion) {
    let channel = EventChannel::<Moved>::new("bench");
    c.bench_function("scoped_add_remove", |b| {
        b.iter(|| {
            let guard = channel.scoped(MovedKind, |_| {});
            drop(black_box(guard));
        })
    });
}

criterion_group!(benches, bench_emit_fanout, bench_scoped_cycle);
criterion_main!(benches);
