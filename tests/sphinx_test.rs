// sphinx_test.rs - sphinx cryptographic packet format tests
// Copyright (C) 2018  David Stainton.

extern crate rand;
extern crate rand_core;
extern crate sphinxpacket;

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use self::rand::rngs::OsRng;
use self::rand_core::{CryptoRng, RngCore};

use sphinxpacket::client::{PathHop, new_path, create_header, create_forward_message, receive_forward};
use sphinxpacket::commands::{NodeId, RoutingRecord};
use sphinxpacket::ecdh::PrivateKey;
use sphinxpacket::error::SphinxError;
use sphinxpacket::group::{Group, RistrettoGroup};
use sphinxpacket::node::{MixNode, VolatileReplayCache};
use sphinxpacket::params::Params;
use sphinxpacket::server::{Action, sphinx_process};
use sphinxpacket::sphinx::Packet;
use sphinxpacket::surb::{create_surb, package_surb, receive_surb, receive_surb_reply,
                         SurbKeyStore, VolatileSurbKeyStore};


struct NodeParams<G: Group = RistrettoGroup> {
    pub id: NodeId,
    pub private_key: PrivateKey<G>,
}

fn new_nodes<G: Group, R: RngCore + CryptoRng>(group: &G, rng: &mut R, num_hops: usize) -> (Vec<NodeParams<G>>, Vec<PathHop<G>>) {
    let nodes: Vec<NodeParams<G>> = (0..num_hops)
        .map(|i| NodeParams {
            id: NodeId::from(format!("node{}", i + 1).as_str()),
            private_key: PrivateKey::generate(group, rng),
        })
        .collect();
    let path = nodes
        .iter()
        .map(|node| PathHop {
            id: node.id.clone(),
            public_key: node.private_key.public_key().clone(),
        })
        .collect();
    (nodes, path)
}

/// Pass a packet through every node, checking each relay decision,
/// and return the last node's action.
fn unwind<G: Group>(params: &Params<G>, nodes: &[NodeParams<G>], mut packet: Packet) -> Action {
    for (i, node) in nodes.iter().enumerate() {
        assert_eq!(packet.header.beta.len(), params.beta_len());
        assert_eq!(packet.delta.len(), params.body_len());
        let unwrapped = sphinx_process(params, &node.private_key, &packet.header, &packet.delta).unwrap();
        if i == nodes.len() - 1 {
            return unwrapped.action;
        }
        match unwrapped.action {
            Action::Relay { next_hop, packet: next } => {
                assert_eq!(next_hop, nodes[i + 1].id);
                packet = next;
            }
            other => panic!("hop {} expected relay, got {:?}", i, other),
        }
    }
    unreachable!()
}

#[test]
fn sphinx_forward_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let message = b"We must defend our own privacy if we expect to have any.";

    for num_hops in 1..8 {
        let (nodes, path) = new_nodes(params.group(), &mut rng, num_hops);
        let packet = create_forward_message(&params, &mut rng, &path, b"bob", message).unwrap();
        match unwind(&params, &nodes, packet) {
            Action::Deliver { delta } => {
                let (dest, msg) = receive_forward(&params, &delta).unwrap();
                assert_eq!(dest, b"bob".to_vec());
                assert_eq!(msg, message.to_vec());
            }
            other => panic!("expected delivery, got {:?}", other),
        }
    }
}

#[test]
fn sphinx_full_body_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 5);
    let destination = b"bob";

    // zero tag, destination length byte and padding marker
    let max_message = params.body_len() - params.k() - 2 - destination.len();
    for &size in &[0, 1, max_message - 1, max_message] {
        let message: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        let packet = create_forward_message(&params, &mut rng, &path, destination, &message).unwrap();
        match unwind(&params, &nodes, packet) {
            Action::Deliver { delta } => {
                let (dest, msg) = receive_forward(&params, &delta).unwrap();
                assert_eq!(dest, destination.to_vec());
                assert_eq!(msg, message);
            }
            other => panic!("expected delivery, got {:?}", other),
        }
    }

    let too_long = vec![0x7fu8; max_message + 1];
    assert_eq!(
        create_forward_message(&params, &mut rng, &path, destination, &too_long).unwrap_err(),
        SphinxError::Capacity { needed: params.body_len() + 1, available: params.body_len() }
    );
}

#[test]
fn sphinx_five_hop_scenario_test() {
    let params: Params = Params::new(RistrettoGroup, 192, 1024).unwrap();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 5);
    let mut packet = create_forward_message(&params, &mut rng, &path, b"bob", b"this is a test").unwrap();

    let mut records = vec![];
    let mut last_delta = None;
    for node in &nodes {
        let unwrapped = sphinx_process(&params, &node.private_key, &packet.header, &packet.delta).unwrap();
        match unwrapped.action {
            Action::Relay { next_hop, packet: next } => {
                records.push(RoutingRecord::Relay(next_hop));
                packet = next;
            }
            Action::Deliver { delta } => {
                records.push(RoutingRecord::Deliver);
                last_delta = Some(delta);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }
    let want: Vec<RoutingRecord> = vec![
        RoutingRecord::Relay(NodeId::from("node2")),
        RoutingRecord::Relay(NodeId::from("node3")),
        RoutingRecord::Relay(NodeId::from("node4")),
        RoutingRecord::Relay(NodeId::from("node5")),
        RoutingRecord::Deliver,
    ];
    assert_eq!(records, want);
    let (dest, msg) = receive_forward(&params, &last_delta.unwrap()).unwrap();
    assert_eq!(dest, b"bob".to_vec());
    assert_eq!(msg, b"this is a test".to_vec());
}

#[test]
fn sphinx_pki_path_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 3);
    let mut pki = HashMap::new();
    for hop in &path {
        pki.insert(hop.id.clone(), hop.public_key.clone());
    }
    let ids: Vec<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();
    let resolved = new_path::<RistrettoGroup, _>(&pki, &ids).unwrap();
    let packet = create_forward_message(&params, &mut rng, &resolved, b"carol", b"via pki").unwrap();
    match unwind(&params, &nodes, packet) {
        Action::Deliver { delta } => {
            assert_eq!(receive_forward(&params, &delta).unwrap(), (b"carol".to_vec(), b"via pki".to_vec()));
        }
        other => panic!("expected delivery, got {:?}", other),
    }
}

#[test]
fn sphinx_capacity_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;

    // seven hops of 23 bytes each fit in 160 bytes of beta, eight do not
    let (_, path) = new_nodes(params.group(), &mut rng, 8);
    match create_forward_message(&params, &mut rng, &path, b"bob", b"hi") {
        Err(SphinxError::Capacity { needed, available }) => {
            assert_eq!(available, params.beta_len());
            assert!(needed > available);
        }
        other => panic!("expected capacity error, got {:?}", other),
    }

    let (_, path) = new_nodes(params.group(), &mut rng, 2);
    let too_long = vec![0x41u8; params.body_len()];
    assert!(create_forward_message(&params, &mut rng, &path, b"bob", &too_long).is_err());
}

#[test]
fn sphinx_constant_header_size_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let mut sizes = vec![];
    for num_hops in 1..8 {
        let (nodes, path) = new_nodes(params.group(), &mut rng, num_hops);
        let (header, _) = create_header(&params, &mut rng, &path, &RoutingRecord::Deliver).unwrap();
        sizes.push(header.beta.len());
        let mut packet = Packet { header, delta: vec![0u8; params.body_len()] };
        for node in &nodes {
            let unwrapped = sphinx_process(&params, &node.private_key, &packet.header, &packet.delta).unwrap();
            if let Action::Relay { packet: next, .. } = unwrapped.action {
                assert_eq!(next.header.beta.len(), params.beta_len());
                assert_eq!(next.header.alpha.len(), packet.header.alpha.len());
                packet = next;
            }
        }
    }
    assert!(sizes.iter().all(|s| *s == params.max_len() - 32));
}

#[test]
fn sphinx_mac_tamper_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 3);
    let packet = create_forward_message(&params, &mut rng, &path, b"bob", b"tamper").unwrap();

    // tamper before the second hop as well as the first
    let second = match sphinx_process(&params, &nodes[0].private_key, &packet.header, &packet.delta).unwrap().action {
        Action::Relay { packet, .. } => packet,
        other => panic!("expected relay, got {:?}", other),
    };

    for (node, packet) in [(&nodes[0], &packet), (&nodes[1], &second)].iter() {
        for bit in 0..packet.header.beta.len() * 8 {
            let mut header = packet.header.clone();
            header.beta[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                sphinx_process(&params, &node.private_key, &header, &packet.delta).unwrap_err(),
                SphinxError::MacMismatch
            );
        }
        for bit in 0..packet.header.gamma.len() * 8 {
            let mut header = packet.header.clone();
            header.gamma[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                sphinx_process(&params, &node.private_key, &header, &packet.delta).unwrap_err(),
                SphinxError::MacMismatch
            );
        }
    }
}

#[test]
fn sphinx_body_tamper_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 2);
    let mut packet = create_forward_message(&params, &mut rng, &path, b"bob", b"tamper").unwrap();
    packet.delta[100] ^= 1;
    match unwind(&params, &nodes, packet) {
        Action::Deliver { delta } => {
            assert_eq!(
                receive_forward(&params, &delta).unwrap_err(),
                SphinxError::MalformedBody("missing zero tag")
            );
        }
        other => panic!("expected delivery, got {:?}", other),
    }
}

/// CountingGroup wraps the Ristretto group and counts exponentiations.
#[derive(Clone, Debug, Default)]
struct CountingGroup {
    inner: RistrettoGroup,
    expons: Rc<Cell<usize>>,
}

impl CountingGroup {
    fn bump(&self) {
        self.expons.set(self.expons.get() + 1);
    }
}

impl Group for CountingGroup {
    type Scalar = <RistrettoGroup as Group>::Scalar;
    type Element = <RistrettoGroup as Group>::Element;

    fn element_size(&self) -> usize {
        self.inner.element_size()
    }

    fn generator(&self) -> Self::Element {
        self.inner.generator()
    }

    fn gen_secret<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Self::Scalar {
        self.inner.gen_secret(rng)
    }

    fn expon(&self, base: &Self::Element, exp: &Self::Scalar) -> Self::Element {
        self.bump();
        self.inner.expon(base, exp)
    }

    fn expon_base(&self, exp: &Self::Scalar) -> Self::Element {
        self.bump();
        self.inner.expon_base(exp)
    }

    fn mul_scalars(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar {
        self.inner.mul_scalars(a, b)
    }

    fn make_exp(&self, raw: &[u8]) -> Result<Self::Scalar, SphinxError> {
        self.inner.make_exp(raw)
    }

    fn from_bytes(&self, raw: &[u8]) -> Result<Self::Element, SphinxError> {
        self.inner.from_bytes(raw)
    }

    fn to_bytes(&self, element: &Self::Element) -> Vec<u8> {
        self.inner.to_bytes(element)
    }
}

#[test]
fn sphinx_invalid_alpha_test() {
    let group = CountingGroup::default();
    let params = Params::new(group.clone(), 192, 1024).unwrap();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(&group, &mut rng, 2);
    let packet = create_forward_message(&params, &mut rng, &path, b"bob", b"hi").unwrap();

    let invalid: Vec<Vec<u8>> = vec![
        vec![0u8; 32],
        vec![0xffu8; 32],
        vec![1u8; 31],
        vec![],
        {
            let mut alpha = packet.header.alpha.clone();
            alpha.push(0);
            alpha
        },
    ];
    for alpha in invalid {
        assert!(!group.in_group(&alpha));
        let mut header = packet.header.clone();
        header.alpha = alpha;
        group.expons.set(0);
        assert_eq!(
            sphinx_process(&params, &nodes[0].private_key, &header, &packet.delta).unwrap_err(),
            SphinxError::GroupMembership
        );
        assert_eq!(group.expons.get(), 0);
    }

    // a valid alpha costs exactly one exponentiation before the MAC check
    let mut header = packet.header.clone();
    header.gamma[0] ^= 1;
    group.expons.set(0);
    assert_eq!(
        sphinx_process(&params, &nodes[0].private_key, &header, &packet.delta).unwrap_err(),
        SphinxError::MacMismatch
    );
    assert_eq!(group.expons.get(), 1);
}

#[test]
fn sphinx_surb_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let reply = b"There was nothing so very remarkable in that.";

    for num_hops in 1..7 {
        let (nodes, path) = new_nodes(params.group(), &mut rng, num_hops);
        let (surb_id, keys, surb) = create_surb(&params, &mut rng, &path, b"alice").unwrap();
        assert_eq!(keys.hop_keys.len(), num_hops);
        assert_eq!(surb.first_hop, nodes[0].id);

        let (first_hop, packet) = package_surb(&params, &surb, reply).unwrap();
        assert_eq!(first_hop, nodes[0].id);
        match unwind(&params, &nodes, packet) {
            Action::SurbDeliver { destination, surb_id: got_id, delta } => {
                assert_eq!(destination, b"alice".to_vec());
                assert_eq!(got_id, surb_id);
                assert_eq!(receive_surb(&params, &keys, &delta).unwrap(), reply.to_vec());
            }
            other => panic!("expected SURB delivery, got {:?}", other),
        }
    }
}

#[test]
fn sphinx_surb_store_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 3);
    let mut store = VolatileSurbKeyStore::new();
    let (surb_id, keys, surb) = create_surb(&params, &mut rng, &path, b"alice").unwrap();
    store.insert(surb_id, keys);

    // the replier's view carries no trace of the creator's address
    let (_, packet) = package_surb(&params, &surb, b"anonymous reply").unwrap();
    assert_eq!(packet.header.beta.len(), params.beta_len());
    assert!(!packet.header.beta.windows(5).any(|w| w == &b"alice"[..]));

    match unwind(&params, &nodes, packet) {
        Action::SurbDeliver { surb_id: got_id, delta, .. } => {
            let msg = receive_surb_reply(&params, &mut store, &got_id, &delta).unwrap();
            assert_eq!(msg, b"anonymous reply".to_vec());
            assert_eq!(
                receive_surb_reply(&params, &mut store, &got_id, &delta).unwrap_err(),
                SphinxError::UnknownSurb
            );
        }
        other => panic!("expected SURB delivery, got {:?}", other),
    }
}

#[test]
fn sphinx_mix_node_test() {
    let params: Params = Params::default();
    let mut rng = OsRng;
    let (nodes, path) = new_nodes(params.group(), &mut rng, 3);
    let mut mixes: Vec<MixNode> = nodes
        .into_iter()
        .map(|node| MixNode::new(node.id, node.private_key, params.clone(), VolatileReplayCache::new()))
        .collect();

    let mut packet = create_forward_message(&params, &mut rng, &path, b"bob", b"mixed").unwrap();
    let first = packet.clone();
    for i in 0..mixes.len() {
        match mixes[i].process(&packet).unwrap() {
            Action::Relay { next_hop, packet: next } => {
                assert_eq!(&next_hop, mixes[i + 1].id());
                packet = next;
            }
            Action::Deliver { delta } => {
                assert_eq!(i, mixes.len() - 1);
                assert_eq!(receive_forward(&params, &delta).unwrap().1, b"mixed".to_vec());
            }
            other => panic!("unexpected action {:?}", other),
        }
    }
    assert_eq!(mixes[0].process(&first).unwrap_err(), SphinxError::ReplayedPacket);
}
