//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Benchmarks for the byte-level engine and Q-Method negotiation.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use telnetix::consts::{self, option};
use telnetix::qmethod::{Direction, OptionStatusRecord, OptionStatusTable};
use telnetix::registry::OptionRegistry;
use telnetix::statemachine::ProtocolEngine;
use telnetix::status;

// ============================================================================
// Byte-level engine: plain data
// ============================================================================

fn bench_step_data_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_data_sizes");

    for size in [10, 100, 1000, 10000].iter() {
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let data: Vec<u8> = (0..size).map(|i| (i % 255) as u8).collect(); // avoid IAC

            b.iter(|| {
                let mut engine = ProtocolEngine::new(Arc::new(OptionRegistry::with_defaults()), "\r\n[Yes]\r\n");
                for &byte in &data {
                    black_box(engine.step(byte));
                }
            });
        });
    }

    group.finish();
}

fn bench_step_crlf(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_crlf");

    group.bench_function("terminated_line", |b| {
        let data = b"Terminated line\r\n";

        b.iter(|| {
            let mut engine = ProtocolEngine::new(Arc::new(OptionRegistry::with_defaults()), "\r\n[Yes]\r\n");
            for &byte in data {
                black_box(engine.step(byte));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Byte-level engine: negotiation
// ============================================================================

fn bench_step_negotiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_negotiation");

    group.bench_function("do_echo", |b| {
        b.iter(|| {
            let registry = Arc::new(OptionRegistry::with_defaults());
            registry.upsert(telnetix::registry::OptionDescriptor::flag(option::ECHO, "ECHO", true, true));
            let mut engine = ProtocolEngine::new(registry, "\r\n[Yes]\r\n");
            black_box(engine.step(consts::IAC));
            black_box(engine.step(consts::DO));
            black_box(engine.step(option::ECHO));
        });
    });

    group.bench_function("will_binary_unsupported", |b| {
        b.iter(|| {
            let mut engine = ProtocolEngine::new(Arc::new(OptionRegistry::new()), "\r\n[Yes]\r\n");
            black_box(engine.step(consts::IAC));
            black_box(engine.step(consts::WILL));
            black_box(engine.step(0x2A));
        });
    });

    group.finish();
}

fn bench_step_subnegotiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_subnegotiation");

    group.bench_function("naws_like", |b| {
        let payload = [consts::IAC, consts::SB, option::NAWS, 0x00, 0x50, 0x00, 0x18, consts::IAC, consts::SE];

        b.iter(|| {
            let registry = Arc::new(OptionRegistry::with_defaults());
            registry.upsert(telnetix::registry::OptionDescriptor::with_subnegotiation(option::NAWS, "NAWS", true, true, 64));
            let mut engine = ProtocolEngine::new(registry, "\r\n[Yes]\r\n");
            engine.status_mut().record_mut(option::NAWS).request_enable(Direction::Local);
            engine.status_mut().record_mut(option::NAWS).peer_affirm(Direction::Local, true);
            for &byte in &payload {
                black_box(engine.step(byte));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Q-Method state transitions
// ============================================================================

fn bench_qmethod_transitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("qmethod_transitions");

    group.bench_function("request_enable_from_no", |b| {
        b.iter(|| {
            let mut record = OptionStatusRecord::new();
            black_box(record.request_enable(black_box(Direction::Local)));
        });
    });

    group.bench_function("peer_affirm_completes", |b| {
        b.iter(|| {
            let mut record = OptionStatusRecord::new();
            record.request_enable(Direction::Remote);
            black_box(record.peer_affirm(black_box(Direction::Remote), true));
        });
    });

    group.bench_function("status_table_is_enabled", |b| {
        let mut table = OptionStatusTable::new();
        table.record_mut(option::ECHO).request_enable(Direction::Local);
        table.record_mut(option::ECHO).peer_affirm(Direction::Local, true);

        b.iter(|| {
            black_box(table.is_enabled(black_box(option::ECHO), Direction::Local));
        });
    });

    group.finish();
}

// ============================================================================
// STATUS (RFC 859) reply construction
// ============================================================================

fn bench_status_is_reply(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_is_reply");

    group.bench_function("few_options_enabled", |b| {
        let registry = OptionRegistry::with_defaults();
        let mut table = OptionStatusTable::new();
        table.record_mut(option::BINARY).request_enable(Direction::Local);
        table.record_mut(option::BINARY).peer_affirm(Direction::Local, true);

        b.iter(|| {
            black_box(status::build_is_reply(black_box(&registry), &table));
        });
    });

    group.bench_function("many_options_enabled", |b| {
        let registry = OptionRegistry::with_defaults();
        let mut table = OptionStatusTable::new();
        for id in [option::BINARY, option::ECHO, option::SUPPRESS_GO_AHEAD, option::NAWS, option::TERMINAL_TYPE] {
            registry.upsert(telnetix::registry::OptionDescriptor::flag(id, "OPT", true, true));
            table.record_mut(id).request_enable(Direction::Local);
            table.record_mut(id).peer_affirm(Direction::Local, true);
            table.record_mut(id).request_enable(Direction::Remote);
            table.record_mut(id).peer_affirm(Direction::Remote, true);
        }

        b.iter(|| {
            black_box(status::build_is_reply(black_box(&registry), &table));
        });
    });

    group.finish();
}

criterion_group!(
    engine_benches,
    bench_step_data_sizes,
    bench_step_crlf,
    bench_step_negotiation,
    bench_step_subnegotiation
);

criterion_group!(qmethod_benches, bench_qmethod_transitions);

criterion_group!(status_benches, bench_status_is_reply);

criterion_main!(engine_benches, qmethod_benches, status_benches);
