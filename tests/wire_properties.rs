//! Properties of the adapter byte stream seen through the public API:
//! commands survive escaping, arbitrary chunking and leading line noise.

use cecbridge::codec::{AdapterFrame, FRAME_START, FrameDecoder, MessageCode};
use cecbridge::wire::{CommandAssembler, Decoded, encode};
use cecbridge::{CecCommand, LogicalAddress, MAX_OPERANDS, Opcode};
use proptest::prelude::*;

prop_compose! {
    fn arb_command()(
        initiator in 0u8..15,
        destination in 0u8..16,
        opcode in any::<u8>(),
        operands in prop::collection::vec(any::<u8>(), 0..=MAX_OPERANDS),
    ) -> CecCommand {
        CecCommand::with_operands(
            LogicalAddress::from_nibble(initiator),
            LogicalAddress::from_nibble(destination),
            Opcode::from(opcode),
            &operands,
        )
        .expect("operand count is bounded")
    }
}

fn wire_of(frames: &[AdapterFrame]) -> Vec<u8> {
    let mut wire = Vec::new();
    for frame in frames {
        frame.encode_into(&mut wire);
    }
    wire
}

/// Feed `wire` in chunks of the given sizes and collect every command.
fn read_back(wire: &[u8], cuts: &[usize]) -> Vec<CecCommand> {
    let mut decoder = FrameDecoder::new();
    let mut assembler = CommandAssembler::new();
    let mut commands = Vec::new();
    let mut rest = wire;
    let mut sizes = cuts.iter().cycle();
    while !rest.is_empty() {
        let n = sizes.next().copied().unwrap_or(1).clamp(1, rest.len());
        let (head, tail) = rest.split_at(n);
        for frame in decoder.push_bytes(head) {
            if let Decoded::Complete(command) = assembler.push(&frame) {
                commands.push(command);
            }
        }
        rest = tail;
    }
    commands
}

fn same_message(a: &CecCommand, b: &CecCommand) -> bool {
    a.initiator == b.initiator
        && a.destination == b.destination
        && a.opcode == b.opcode
        && a.operands() == b.operands()
}

proptest! {
    #[test]
    fn transmissions_read_back_under_any_chunking(
        commands in prop::collection::vec(arb_command(), 1..6),
        cuts in prop::collection::vec(1usize..9, 1..16),
    ) {
        let frames: Vec<AdapterFrame> = commands.iter().flat_map(encode).collect();
        // A trailing start byte closes the last frame.
        let mut wire = wire_of(&frames);
        wire.push(FRAME_START);

        let decoded = read_back(&wire, &cuts);
        prop_assert_eq!(decoded.len(), commands.len());
        for (sent, seen) in commands.iter().zip(&decoded) {
            prop_assert!(same_message(sent, seen), "sent {:?}, read back {:?}", sent, seen);
        }
    }

    #[test]
    fn noise_before_the_first_frame_is_ignored(
        noise in prop::collection::vec(any::<u8>().prop_filter("not a frame start", |b| *b != FRAME_START), 0..32),
        command in arb_command(),
    ) {
        let mut wire = noise;
        wire.extend(wire_of(&encode(&command)));
        wire.push(FRAME_START);

        let decoded = read_back(&wire, &[3]);
        prop_assert_eq!(decoded.len(), 1);
        prop_assert!(same_message(&command, &decoded[0]));
    }

    #[test]
    fn only_the_last_transmit_frame_ends_the_message(command in arb_command()) {
        let frames = encode(&command);
        prop_assert_eq!(frames[0].message(), MessageCode::TransmitAckPolarity);
        prop_assert_eq!(frames.len(), command.wire_len() + 1);
        let eom = frames.iter().filter(|f| f.message() == MessageCode::TransmitEom).count();
        prop_assert_eq!(eom, 1);
        prop_assert_eq!(frames[frames.len() - 1].message(), MessageCode::TransmitEom);
    }
}

#[test]
fn polls_travel_as_a_single_header_frame() {
    let poll = CecCommand::poll(LogicalAddress::Playback1, LogicalAddress::Tv);
    let frames = encode(&poll);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].message(), MessageCode::TransmitEom);
    assert_eq!(frames[1].data(), &[0x40]);

    let mut wire = wire_of(&frames);
    wire.push(FRAME_START);
    let decoded = read_back(&wire, &[64]);
    assert_eq!(decoded.len(), 1);
    assert!(decoded[0].is_poll());
}
