//! Builders for small GLB buffers, so tests don't need binary files.

/// Wrap a JSON document and a binary chunk into a GLB container.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut buffer = Vec::with_capacity(total);
    buffer.extend_from_slice(b"glTF");
    buffer.extend_from_slice(&2u32.to_le_bytes());
    buffer.extend_from_slice(&(total as u32).to_le_bytes());
    buffer.extend_from_slice(&(json.len() as u32).to_le_bytes());
    buffer.extend_from_slice(b"JSON");
    buffer.extend_from_slice(&json);
    buffer.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    buffer.extend_from_slice(b"BIN\0");
    buffer.extend_from_slice(&bin);
    buffer
}

/// A row of unit right triangles in the XY plane, facing +Z.
///
/// Node `i` is translated to `(2 * i, 0, 0)` and owns mesh `i`. All meshes
/// share the same accessors and the single material `"Base"`.
#[derive(Debug, Clone)]
pub struct GlbFixture {
    names: Vec<Option<String>>,
    children: Vec<Vec<usize>>,
    indexed: bool,
    required_extensions: Vec<String>,
}

impl GlbFixture {
    pub const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    pub const BASE_COLOR: [f32; 4] = [0.2, 0.4, 0.6, 1.0];

    pub fn triangles(count: usize) -> Self {
        Self {
            names: vec![None; count],
            children: vec![Vec::new(); count],
            indexed: true,
            required_extensions: Vec::new(),
        }
    }

    pub fn named(mut self, index: usize, name: &str) -> Self {
        self.names[index] = Some(name.to_string());
        self
    }

    /// Add `child` below node `index`. Loops are not rejected here.
    pub fn with_child(mut self, index: usize, child: usize) -> Self {
        self.children[index].push(child);
        self
    }

    pub fn non_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    pub fn requiring(mut self, extension: &str) -> Self {
        self.required_extensions.push(extension.to_string());
        self
    }

    fn binary(&self) -> Vec<u8> {
        let mut bin = Vec::new();
        for position in Self::TRIANGLE {
            for component in position {
                bin.extend_from_slice(&component.to_le_bytes());
            }
        }
        if self.indexed {
            for index in [0u32, 1, 2] {
                bin.extend_from_slice(&index.to_le_bytes());
            }
        }
        bin
    }

    fn json(&self, bin_length: usize) -> String {
        let nodes: Vec<String> = self
            .names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let name = name
                    .as_ref()
                    .map(|name| format!(r#","name":"{}""#, name.replace('"', "\\\"")))
                    .unwrap_or_default();
                let children = if self.children[index].is_empty() {
                    String::new()
                } else {
                    let list: Vec<String> = self.children[index]
                        .iter()
                        .map(|child| child.to_string())
                        .collect();
                    format!(r#","children":[{}]"#, list.join(","))
                };
                format!(
                    r#"{{"mesh":{},"translation":[{}.0,0.0,0.0]{}{}}}"#,
                    index,
                    index * 2,
                    name,
                    children
                )
            })
            .collect();
        let primitive = if self.indexed {
            r#"{"attributes":{"POSITION":0},"indices":1,"material":0}"#
        } else {
            r#"{"attributes":{"POSITION":0},"material":0}"#
        };
        let meshes: Vec<String> = self
            .names
            .iter()
            .map(|_| format!(r#"{{"primitives":[{}]}}"#, primitive))
            .collect();
        let (buffer_views, accessors) = if self.indexed {
            (
                r#"[{"buffer":0,"byteOffset":0,"byteLength":36},{"buffer":0,"byteOffset":36,"byteLength":12}]"#,
                r#"[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]},{"bufferView":1,"componentType":5125,"count":3,"type":"SCALAR"}]"#,
            )
        } else {
            (
                r#"[{"buffer":0,"byteOffset":0,"byteLength":36}]"#,
                r#"[{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}]"#,
            )
        };
        let extensions = if self.required_extensions.is_empty() {
            String::new()
        } else {
            let list: Vec<String> = self
                .required_extensions
                .iter()
                .map(|extension| format!(r#""{}""#, extension))
                .collect();
            format!(
                r#","extensionsUsed":[{0}],"extensionsRequired":[{0}]"#,
                list.join(",")
            )
        };
        let [red, green, blue, alpha] = Self::BASE_COLOR;
        format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[{}]}}],"#,
                r#""nodes":[{}],"meshes":[{}],"#,
                r#""materials":[{{"name":"Base","pbrMetallicRoughness":{{"baseColorFactor":[{},{},{},{}],"metallicFactor":0.25,"roughnessFactor":0.75}}}}],"#,
                r#""buffers":[{{"byteLength":{}}}],"bufferViews":{},"accessors":{}{}}}"#
            ),
            (0..self.names.len())
                .map(|index| index.to_string())
                .collect::<Vec<_>>()
                .join(","),
            nodes.join(","),
            meshes.join(","),
            red,
            green,
            blue,
            alpha,
            bin_length,
            buffer_views,
            accessors,
            extensions,
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let bin = self.binary();
        glb(&self.json(bin.len()), &bin)
    }
}
