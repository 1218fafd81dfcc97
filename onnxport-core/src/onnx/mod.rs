//! ONNX model I/O.
//!
//! Decodes `.onnx` protobuf payloads into [`proto::ModelProto`] and keeps
//! the original serialized bytes alongside, so that saving a model that
//! was only passed through reproduces the input byte-for-byte.

pub mod proto;

use crate::error::ConvertError;
use prost::Message;
use std::path::Path;

/// An in-memory ONNX model: decoded graph plus its serialized form.
#[derive(Debug, Clone)]
pub struct OnnxModel {
    model: proto::ModelProto,
    bytes: Vec<u8>,
}

/// Name and shape of a graph input tensor. Symbolic dimensions are
/// reported as -1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub dims: Vec<i64>,
}

impl OnnxModel {
    /// Load and decode an ONNX file.
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Decode an ONNX payload, retaining the serialized bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ConvertError> {
        let model = proto::ModelProto::decode(bytes.as_slice())?;
        if model.graph.is_none() {
            return Err(ConvertError::MissingGraph);
        }
        Ok(Self { model, bytes })
    }

    /// Build a model from a proto, serializing it as the canonical bytes.
    pub fn from_proto(model: proto::ModelProto) -> Result<Self, ConvertError> {
        if model.graph.is_none() {
            return Err(ConvertError::MissingGraph);
        }
        let bytes = model.encode_to_vec();
        Ok(Self { model, bytes })
    }

    /// Write the model to a file. For models that were loaded rather than
    /// built, this reproduces the source payload exactly.
    pub fn save(&self, path: &Path) -> Result<(), ConvertError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    /// The serialized protobuf payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded model.
    pub fn proto(&self) -> &proto::ModelProto {
        &self.model
    }

    /// The computation graph.
    pub fn graph(&self) -> &proto::GraphProto {
        // Presence is checked at construction.
        self.model.graph.as_ref().expect("graph checked on decode")
    }

    /// The default-domain opset version, if declared.
    pub fn opset_version(&self) -> Option<i64> {
        self.model
            .opset_import
            .iter()
            .find(|op| op.domain.is_empty() || op.domain == "ai.onnx")
            .map(|op| op.version)
    }

    /// Names and shapes of the graph inputs.
    pub fn inputs(&self) -> Vec<TensorInfo> {
        self.graph()
            .input
            .iter()
            .map(|inp| {
                let dims = inp
                    .r#type
                    .as_ref()
                    .and_then(|t| t.value.as_ref())
                    .map(|proto::type_proto::Value::TensorType(tt)| {
                        tt.shape
                            .as_ref()
                            .map(|s| {
                                s.dim
                                    .iter()
                                    .map(|d| match &d.value {
                                        Some(
                                            proto::tensor_shape_proto::dimension::Value::DimValue(
                                                v,
                                            ),
                                        ) => *v,
                                        _ => -1,
                                    })
                                    .collect()
                            })
                            .unwrap_or_default()
                    })
                    .unwrap_or_default();
                TensorInfo {
                    name: inp.name.clone(),
                    dims,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal but valid single-input Identity model.
    fn tiny_model(input_name: &str, dims: &[i64]) -> proto::ModelProto {
        let shape = proto::TensorShapeProto {
            dim: dims
                .iter()
                .map(|&d| proto::tensor_shape_proto::Dimension {
                    denotation: String::new(),
                    value: Some(proto::tensor_shape_proto::dimension::Value::DimValue(d)),
                })
                .collect(),
        };
        let tensor_type = proto::type_proto::Tensor {
            elem_type: 1, // FLOAT
            shape: Some(shape),
        };
        let value_info = |name: &str| proto::ValueInfoProto {
            name: name.to_string(),
            r#type: Some(proto::TypeProto {
                denotation: String::new(),
                value: Some(proto::type_proto::Value::TensorType(tensor_type.clone())),
            }),
            doc_string: String::new(),
        };

        proto::ModelProto {
            ir_version: 8,
            producer_name: "onnxport-test".to_string(),
            graph: Some(proto::GraphProto {
                name: "g".to_string(),
                node: vec![proto::NodeProto {
                    input: vec![input_name.to_string()],
                    output: vec!["y".to_string()],
                    op_type: "Identity".to_string(),
                    ..Default::default()
                }],
                input: vec![value_info(input_name)],
                output: vec![value_info("y")],
                ..Default::default()
            }),
            opset_import: vec![proto::OperatorSetIdProto {
                domain: String::new(),
                version: 13,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_load_save_roundtrip_is_byte_exact() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("model.onnx");
        let model = OnnxModel::from_proto(tiny_model("x", &[1, 100])).unwrap();
        model.save(&src).unwrap();
        let original = std::fs::read(&src).unwrap();

        let reloaded = OnnxModel::load(&src).unwrap();
        let dst = dir.path().join("copy.onnx");
        reloaded.save(&dst).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), original);
    }

    #[test]
    fn test_inputs_report_name_and_shape() {
        let model = OnnxModel::from_proto(tiny_model("x", &[1, 100])).unwrap();
        let inputs = model.inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "x");
        assert_eq!(inputs[0].dims, vec![1, 100]);
        assert_eq!(model.opset_version(), Some(13));
    }

    #[test]
    fn test_decode_garbage_fails() {
        // A long run of 0xff bytes is not a valid length-delimited message.
        let err = OnnxModel::from_bytes(vec![0xff; 64]).unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)));
    }

    #[test]
    fn test_missing_graph_rejected() {
        let model = proto::ModelProto {
            ir_version: 8,
            ..Default::default()
        };
        let err = OnnxModel::from_bytes(prost::Message::encode_to_vec(&model)).unwrap_err();
        assert!(matches!(err, ConvertError::MissingGraph));
    }
}
