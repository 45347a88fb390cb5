//! Builds small binary glTF files in memory.

use serde_json::{Value, json};

const FLOAT: u32 = 5126;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

#[derive(Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl GlbBuilder {
    fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": self.bin.len(),
            "byteLength": bytes.len(),
        }));
        self.bin.extend_from_slice(bytes);
        self.views.len() - 1
    }

    fn accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// `values` holds `width` floats per element. Every float accessor gets
    /// min and max, which glTF requires for positions and key times.
    pub fn floats(&mut self, values: &[f32], ty: &str, width: usize) -> usize {
        let view = self.view(bytemuck::cast_slice(values));
        let count = values.len() / width;
        let mut min = vec![f32::MAX; width];
        let mut max = vec![f32::MIN; width];
        for element in values.chunks(width) {
            for (c, v) in element.iter().enumerate() {
                min[c] = min[c].min(*v);
                max[c] = max[c].max(*v);
            }
        }
        self.accessor(json!({
            "bufferView": view,
            "componentType": FLOAT,
            "count": count,
            "type": ty,
            "min": min,
            "max": max,
        }))
    }

    pub fn joints(&mut self, values: &[[u16; 4]]) -> usize {
        let view = self.view(bytemuck::cast_slice(values));
        self.accessor(json!({
            "bufferView": view,
            "componentType": UNSIGNED_SHORT,
            "count": values.len(),
            "type": "VEC4",
        }))
    }

    pub fn indices(&mut self, values: &[u32]) -> usize {
        let view = self.view(bytemuck::cast_slice(values));
        self.accessor(json!({
            "bufferView": view,
            "componentType": UNSIGNED_INT,
            "count": values.len(),
            "type": "SCALAR",
        }))
    }

    /// Attributes of a triangle list with +Z normals.
    pub fn triangles(&mut self, positions: &[[f32; 3]], indices: &[u32]) -> Value {
        let flat: Vec<f32> = positions.iter().flatten().copied().collect();
        let normals: Vec<f32> = positions.iter().flat_map(|_| [0.0, 0.0, 1.0]).collect();
        let position = self.floats(&flat, "VEC3", 3);
        let normal = self.floats(&normals, "VEC3", 3);
        let indices = self.indices(indices);
        json!({
            "attributes": { "POSITION": position, "NORMAL": normal },
            "indices": indices,
        })
    }

    /// Complete `document` with buffers and accessors and pack it as `.glb`.
    pub fn finish(mut self, mut document: Value) -> Vec<u8> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        document["asset"] = json!({ "version": "2.0" });
        document["buffers"] = json!([{ "byteLength": self.bin.len() }]);
        document["bufferViews"] = Value::Array(self.views);
        document["accessors"] = Value::Array(self.accessors);

        let mut text = serde_json::to_vec(&document).unwrap();
        while text.len() % 4 != 0 {
            text.push(b' ');
        }

        let total = 12 + 8 + text.len() + 8 + self.bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(text.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&text);
        out.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&self.bin);
        out
    }
}
