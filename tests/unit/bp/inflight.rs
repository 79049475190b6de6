use axon::bp::snp::inflight::{INFLIGHT_CAPACITY, InflightBuffer};

#[test]
fn record_snapshots_are_sized_at_construction() {
    let buf = InflightBuffer::new(8, 4);
    assert_eq!(buf.record(0).pattern.len(), 8);
    assert_eq!(buf.record(0).path.len(), 4);
}

#[test]
fn slots_are_reused_in_circular_order() {
    let mut buf = InflightBuffer::new(8, 4);

    for i in 0..INFLIGHT_CAPACITY {
        let slot = buf.allocate(0x4000 + i as u64 * 4, 0);
        assert_eq!(slot, i);
        let token = buf.token(slot);
        buf.resolve(token);
    }

    // A full cycle later the first slot comes back around.
    assert_eq!(buf.allocate(0x8000, 0), 0);
}

#[test]
fn resolution_reads_back_the_recorded_state() {
    let mut buf = InflightBuffer::new(8, 4);
    let slot = buf.allocate(0x4abc, 1);
    buf.record_mut(slot).output = -17;
    buf.record_mut(slot).taken = false;

    let token = buf.token(slot);
    assert!(!token.taken);

    let rec = buf.resolve(token);
    assert_eq!(rec.address, 0x4abc);
    assert_eq!(rec.set, 1);
    assert_eq!(rec.output, -17);
}

#[test]
#[should_panic(expected = "does not match a pending prediction")]
fn double_resolution_is_rejected() {
    let mut buf = InflightBuffer::new(8, 4);
    let slot = buf.allocate(0x4000, 0);
    let token = buf.token(slot);
    buf.resolve(token);
    buf.resolve(token);
}

#[test]
#[should_panic(expected = "in-flight capacity exceeded")]
fn unresolved_slot_reuse_is_rejected() {
    let mut buf = InflightBuffer::new(8, 4);
    for i in 0..=INFLIGHT_CAPACITY {
        buf.allocate(i as u64 * 4, 0);
    }
}

#[test]
#[should_panic(expected = "does not match a pending prediction")]
fn stale_token_is_rejected() {
    let mut buf = InflightBuffer::new(8, 4);
    let slot = buf.allocate(0x4000, 0);
    let stale = buf.token(slot);
    buf.resolve(stale);

    // Run a full lap so the slot has held a newer prediction since.
    for i in 0..INFLIGHT_CAPACITY {
        let slot = buf.allocate(i as u64 * 4, 0);
        let token = buf.token(slot);
        buf.resolve(token);
    }
    buf.resolve(stale);
}
