use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rewind_callrec::protocol::rewind::{
    Callsign, PacketEncoder, PacketType, RewindPacket, SessionType, SuperHeader,
    challenge_response,
};

fn packet_benchmark(c: &mut Criterion) {
    // A voice frame as the relay sends it
    let mut encoder = PacketEncoder::starting_at(1_000_000);
    let frame = encoder.encode(PacketType::AudioFrame, Bytes::from(vec![0x5a; 27]));

    c.bench_function("rewind_decode_audio_frame", |b| {
        b.iter(|| RewindPacket::decode(black_box(&frame)).unwrap())
    });

    let packet = RewindPacket::decode(&frame).unwrap();
    c.bench_function("rewind_encode_audio_frame", |b| {
        b.iter(|| black_box(&packet).encode())
    });
}

fn payload_benchmark(c: &mut Criterion) {
    let header = SuperHeader {
        session_type: SessionType::GroupVoice,
        src_id: 2_161_005,
        dst_id: 216,
        src_call: Callsign::pad("HA2NON"),
        dst_call: Callsign::empty(),
    };
    let encoded = header.encode();

    c.bench_function("rewind_decode_super_header", |b| {
        b.iter(|| SuperHeader::decode(black_box(&encoded)).unwrap())
    });

    c.bench_function("rewind_challenge_response", |b| {
        b.iter(|| challenge_response(black_box(b"0123456789abcdef"), black_box("passw0rd")))
    });
}

criterion_group!(benches, packet_benchmark, payload_benchmark);
criterion_main!(benches);
