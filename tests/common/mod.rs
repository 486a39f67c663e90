//! Tiny ONNX models for exercising the real inference path.
//!
//! The graph counts the in-vocabulary tokens of the input and turns that count `k`
//! into logits `k * weights + bias`:
//!
//! ```text
//! known  = Cast(Greater(input_ids, 0))          [UNK] has id 0
//! k      = ReduceSum(known * Cast(attention_mask), axis 1)
//! k     += ReduceSum(Cast(token_type_ids), axis 1)   only when declared
//! logits = k * weights + bias                   shape [batch, num_labels]
//! ```
//!
//! With the default two-label weights a message scores `Relevant` once it has more than
//! four known tokens.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const FIXTURE_TOKENIZER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tokenizer.json");

/// Known-token count above which the two-label model answers `Relevant`.
pub const RELEVANCE_THRESHOLD: f32 = 4.5;

const FLOAT: i64 = 1;
const INT64: i64 = 7;
const ATTRIBUTE_INT: i64 = 2;

/// Minimal protobuf writer, enough for the ONNX messages used here.
#[derive(Default)]
struct Message(Vec<u8>);

impl Message {
    fn varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.0.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.0.push(value as u8);
    }

    fn key(&mut self, field: u32, wire_type: u8) {
        self.varint(((field as u64) << 3) | wire_type as u64);
    }

    fn int(mut self, field: u32, value: i64) -> Self {
        self.key(field, 0);
        self.varint(value as u64);
        self
    }

    fn bytes(mut self, field: u32, value: &[u8]) -> Self {
        self.key(field, 2);
        self.varint(value.len() as u64);
        self.0.extend_from_slice(value);
        self
    }

    fn string(self, field: u32, value: &str) -> Self {
        self.bytes(field, value.as_bytes())
    }

    fn message(self, field: u32, value: Message) -> Self {
        self.bytes(field, &value.0)
    }
}

enum Dim {
    Fixed(i64),
    Named(&'static str),
}

fn value_info(name: &str, elem_type: i64, dims: &[Dim]) -> Message {
    let shape = dims.iter().fold(Message::default(), |shape, dim| {
        let dim = match dim {
            Dim::Fixed(value) => Message::default().int(1, *value),
            Dim::Named(param) => Message::default().string(2, param),
        };
        shape.message(1, dim)
    });
    let tensor_type = Message::default().int(1, elem_type).message(2, shape);
    Message::default()
        .string(1, name)
        .message(2, Message::default().message(1, tensor_type))
}

fn float_tensor(name: &str, dims: &[i64], values: &[f32]) -> Message {
    let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let tensor = dims.iter().fold(Message::default(), |t, &d| t.int(1, d));
    tensor.int(2, FLOAT).string(8, name).bytes(9, &raw)
}

fn int64_tensor(name: &str, dims: &[i64], values: &[i64]) -> Message {
    let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let tensor = dims.iter().fold(Message::default(), |t, &d| t.int(1, d));
    tensor.int(2, INT64).string(8, name).bytes(9, &raw)
}

fn node(op_type: &str, inputs: &[&str], output: &str) -> Message {
    let node = inputs.iter().fold(Message::default(), |n, input| n.string(1, input));
    node.string(2, output).string(3, output).string(4, op_type)
}

fn cast_to_float(input: &str, output: &str) -> Message {
    let to = Message::default().string(1, "to").int(3, FLOAT).int(20, ATTRIBUTE_INT);
    node("Cast", &[input], output).message(5, to)
}

/// Serialized ONNX model (opset 13) with `weights.len()` logits.
pub fn relevance_model_bytes(weights: &[f32], bias: &[f32], with_token_type_ids: bool) -> Vec<u8> {
    assert_eq!(weights.len(), bias.len());
    let labels = weights.len() as i64;
    let sequence = [Dim::Named("batch"), Dim::Named("sequence")];

    let mut nodes = vec![
        node("Greater", &["input_ids", "zero"], "is_known"),
        cast_to_float("is_known", "known"),
        cast_to_float("attention_mask", "mask"),
        node("Mul", &["known", "mask"], "counted"),
        node("ReduceSum", &["counted", "axes"], "token_count"),
    ];
    let mut count = "token_count";
    if with_token_type_ids {
        nodes.push(cast_to_float("token_type_ids", "segments"));
        nodes.push(node("ReduceSum", &["segments", "axes"], "segment_count"));
        nodes.push(node("Add", &["token_count", "segment_count"], "total_count"));
        count = "total_count";
    }
    nodes.push(node("Mul", &[count, "weights"], "scaled"));
    nodes.push(node("Add", &["scaled", "bias"], "logits"));

    let mut graph = nodes
        .into_iter()
        .fold(Message::default(), |g, n| g.message(1, n))
        .string(2, "relevance")
        .message(5, int64_tensor("zero", &[], &[0]))
        .message(5, int64_tensor("axes", &[1], &[1]))
        .message(5, float_tensor("weights", &[1, labels], weights))
        .message(5, float_tensor("bias", &[1, labels], bias))
        .message(11, value_info("input_ids", INT64, &sequence))
        .message(11, value_info("attention_mask", INT64, &sequence));
    if with_token_type_ids {
        graph = graph.message(11, value_info("token_type_ids", INT64, &sequence));
    }
    let graph = graph.message(
        12,
        value_info("logits", FLOAT, &[Dim::Named("batch"), Dim::Fixed(labels)]),
    );

    Message::default()
        .int(1, 8)
        .string(2, "disaster-tweets-tests")
        .message(7, graph)
        .message(8, Message::default().string(1, "").int(2, 13))
        .0
}

pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("disaster-tweets-onnx")
        .join(format!("{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_model(dir: &Path, bytes: &[u8]) -> PathBuf {
    let path = dir.join("model.onnx");
    fs::write(&path, bytes).unwrap();
    path
}

/// Two-label model: `Not Relevant` up to four known tokens, `Relevant` above.
pub fn two_label_model(name: &str) -> PathBuf {
    let bytes = relevance_model_bytes(
        &[-1.0, 1.0],
        &[RELEVANCE_THRESHOLD, -RELEVANCE_THRESHOLD],
        false,
    );
    write_model(&scratch_dir(name), &bytes)
}

/// Same decision rule, but the model also declares a `token_type_ids` input.
pub fn segment_aware_model(name: &str) -> PathBuf {
    let bytes = relevance_model_bytes(
        &[-1.0, 1.0],
        &[RELEVANCE_THRESHOLD, -RELEVANCE_THRESHOLD],
        true,
    );
    write_model(&scratch_dir(name), &bytes)
}

pub fn three_label_model(name: &str) -> PathBuf {
    let bytes = relevance_model_bytes(&[-1.0, 1.0, 0.0], &[RELEVANCE_THRESHOLD, -RELEVANCE_THRESHOLD, 0.0], false);
    write_model(&scratch_dir(name), &bytes)
}
