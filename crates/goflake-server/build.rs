//! Generates the `goflake.FlakeService` gRPC server with `tonic-prost-build`.
//!
//! The messages are plain `prost` structs in `src/proto.rs`, so the service is
//! described with the manual builder and no `protoc` is needed. The same
//! contract is encoded as a `FileDescriptorSet` for the reflection service.
//! `proto/goflake.proto` is the human-readable copy of both and must be kept in
//! sync with this file.
//!
//! # Output
//!
//! - `$OUT_DIR/goflake.FlakeService.rs`: the `flake_service_server` module.
//! - `$OUT_DIR/goflake_descriptor.bin`: the encoded descriptor set.
use prost::Message;
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
    field_descriptor_proto::{Label, Type},
};
use std::env;
use std::fs;
use std::path::PathBuf;
use tonic_prost_build::manual::{Builder, Method, Service};

const PACKAGE: &str = "goflake";
const SERVICE: &str = "FlakeService";
const CODEC: &str = "tonic_prost::ProstCodec";

/// `(method, route, request, response)`, the last two under `crate::proto`.
const METHODS: [(&str, &str, &str, &str); 2] = [
    ("get_uuid", "GetUUID", "GetUuidRequest", "GetUuidResponse"),
    ("decompose", "Decompose", "DecomposeRequest", "DecomposeResponse"),
];

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let mut service = Service::builder().name(SERVICE).package(PACKAGE);
    for (name, route, input, output) in METHODS {
        service = service.method(
            Method::builder()
                .name(name)
                .route_name(route)
                .input_type(format!("crate::proto::{input}"))
                .output_type(format!("crate::proto::{output}"))
                .codec_path(CODEC)
                .build(),
        );
    }

    Builder::new()
        .build_client(false)
        .out_dir(&out_dir)
        .compile(&[service.build()]);

    let descriptor = FileDescriptorSet {
        file: vec![file_descriptor()],
    };
    fs::write(
        out_dir.join("goflake_descriptor.bin"),
        descriptor.encode_to_vec(),
    )
    .unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}

fn file_descriptor() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("goflake.proto".into()),
        package: Some(PACKAGE.into()),
        message_type: vec![
            message("GetUUIDRequest", vec![]),
            message("GetUUIDResponse", vec![field("uuid", 1, Type::Uint64)]),
            message("DecomposeRequest", vec![field("uuid", 1, Type::Uint64)]),
            message(
                "DecomposeResponse",
                vec![
                    field("uuid", 1, Type::String),
                    field("timestamp", 2, Type::String),
                    field("datacenter_id", 3, Type::String),
                    field("machine_id", 4, Type::String),
                    field("sequence", 5, Type::String),
                    field("msb", 6, Type::Bool),
                ],
            ),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some(SERVICE.into()),
            method: vec![
                method("GetUUID", "GetUUIDRequest", "GetUUIDResponse"),
                method("Decompose", "DecomposeRequest", "DecomposeResponse"),
            ],
            ..Default::default()
        }],
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.into()),
        input_type: Some(format!(".{PACKAGE}.{input}")),
        output_type: Some(format!(".{PACKAGE}.{output}")),
        ..Default::default()
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field,
        ..Default::default()
    }
}

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

/// `datacenter_id` -> `datacenterId`, as `protoc` fills it in.
fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
