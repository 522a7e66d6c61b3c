use tempfile::TempDir;

pub fn temp_data_dir() -> TempDir {
    return tempfile::Builder::new()
        .prefix("genstudio-test")
        .tempdir()
        .unwrap();
}

pub fn catalog_fixture() -> &'static str {
    return r#"
[
  {
    "id": "nano-banana",
    "name": "Nano Banana",
    "endpoint": "nano-banana",
    "inputs": {
      "prompt": { "type": "free", "kind": "string" },
      "aspect_ratio": { "type": "enum", "values": ["1:1", "16:9", "9:16"], "default": "1:1" }
    }
  },
  {
    "id": "flux-dev",
    "name": "Flux Dev",
    "inputs": {
      "prompt": { "type": "free", "kind": "string" },
      "guidance": { "type": "range", "min": 1.0, "max": 10.0, "step": 0.5, "default": 3.5 }
    }
  },
  {
    "id": "seedream-4",
    "name": "Seedream 4.0",
    "endpoint": "bytedance-seedream-v4",
    "inputs": {
      "aspect_ratio": { "type": "enum", "values": ["16:9", "1:1"] },
      "resolution": { "type": "enum", "values": ["2k", "4k"], "default": "2k" }
    }
  },
  {
    "id": "qwen-image",
    "name": "Qwen Image",
    "inputs": {
      "megapixels": { "type": "enum", "values": ["1", "0.25"], "default": "1" }
    }
  }
]
"#
    .trim();
}
