use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use super::{Material, Mesh, ModelVertex, Texture};
use crate::error::ViewerError;

/// CPU-side mesh ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialData {
    pub name: String,
    pub diffuse_texture: Option<PathBuf>,
}

/// Parsed OBJ file with its MTL materials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl ObjModel {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let default_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mesh");
        parse_obj(BufReader::new(file), base_dir, default_name)
    }
}

/// Mesh under construction. Vertices are shared between faces that use the
/// same position/uv/normal triple.
struct MeshBuilder {
    name: String,
    material: Option<usize>,
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    lookup: HashMap<(usize, Option<usize>, Option<usize>), u32>,
}

impl MeshBuilder {
    fn new(name: String, material: Option<usize>) -> Self {
        Self {
            name,
            material,
            vertices: Vec::new(),
            indices: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn finish(self) -> Option<MeshData> {
        if self.indices.is_empty() {
            return None;
        }
        Some(MeshData {
            name: self.name,
            vertices: self.vertices,
            indices: self.indices,
            material: self.material,
        })
    }
}

#[derive(Default)]
struct ObjData {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

impl ObjData {
    fn vertex_index(&self, builder: &mut MeshBuilder, token: &str) -> Result<u32> {
        let mut parts = token.split('/');
        let position = parts
            .next()
            .ok_or_else(|| anyhow!("empty face vertex"))
            .and_then(|s| resolve_index(s, self.positions.len()))?;
        let tex_coord = match parts.next() {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.tex_coords.len())?),
            _ => None,
        };
        let normal = match parts.next() {
            Some(s) if !s.is_empty() => Some(resolve_index(s, self.normals.len())?),
            _ => None,
        };

        let key = (position, tex_coord, normal);
        if let Some(&index) = builder.lookup.get(&key) {
            return Ok(index);
        }

        // Images are stored top row first, OBJ uvs start at the bottom
        let tex_coords = tex_coord
            .map(|i| [self.tex_coords[i][0], 1.0 - self.tex_coords[i][1]])
            .unwrap_or([0.0, 0.0]);
        let vertex = ModelVertex {
            position: self.positions[position],
            tex_coords,
            normal: normal.map(|i| self.normals[i]).unwrap_or([0.0, 1.0, 0.0]),
        };

        let index = builder.vertices.len() as u32;
        builder.vertices.push(vertex);
        builder.lookup.insert(key, index);
        Ok(index)
    }

    fn process_face(&self, builder: &mut MeshBuilder, face_tokens: &[&str]) -> Result<()> {
        let vertex_indices = face_tokens
            .iter()
            .map(|token| self.vertex_index(builder, token))
            .collect::<Result<Vec<_>>>()?;

        // Fan triangulation, faces are assumed convex
        for i in 1..vertex_indices.len() - 1 {
            builder.indices.extend_from_slice(&[
                vertex_indices[0],
                vertex_indices[i],
                vertex_indices[i + 1],
            ]);
        }
        Ok(())
    }
}

/// OBJ indices are 1-based; negative indices count back from the end.
fn resolve_index(token: &str, len: usize) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .with_context(|| format!("invalid index '{token}'"))?;
    let index = match raw {
        0 => bail!("index 0 is not valid in OBJ"),
        i if i > 0 => i - 1,
        i => len as i64 + i,
    };
    if index < 0 || index as usize >= len {
        bail!("index {raw} out of range ({len} elements)");
    }
    Ok(index as usize)
}

fn parse_floats<const N: usize>(tokens: &[&str]) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = token
            .parse()
            .with_context(|| format!("invalid number '{token}'"))?;
    }
    Ok(out)
}

struct ObjParser<'a> {
    data: ObjData,
    model: ObjModel,
    material_ids: HashMap<String, usize>,
    current: MeshBuilder,
    base_dir: &'a Path,
    default_name: &'a str,
}

impl<'a> ObjParser<'a> {
    fn new(base_dir: &'a Path, default_name: &'a str) -> Self {
        Self {
            data: ObjData::default(),
            model: ObjModel::default(),
            material_ids: HashMap::new(),
            current: MeshBuilder::new(default_name.to_string(), None),
            base_dir,
            default_name,
        }
    }

    fn line(&mut self, keyword: &str, args: &[&str]) -> Result<()> {
        match keyword {
            "v" if args.len() >= 3 => self.data.positions.push(parse_floats(args)?),
            // A missing v defaults to 0
            "vt" if !args.is_empty() => self.data.tex_coords.push(parse_floats(args)?),
            "vn" if args.len() >= 3 => self.data.normals.push(parse_floats(args)?),
            "f" if args.len() >= 3 => self.data.process_face(&mut self.current, args)?,
            "o" | "g" => {
                let name = match args.join(" ") {
                    name if name.is_empty() => self.default_name.to_string(),
                    name => name,
                };
                let material = self.current.material;
                self.start_mesh(name, material);
            }
            "usemtl" => {
                let name = args.join(" ");
                let material = self.material_ids.get(&name).copied();
                if material.is_none() {
                    log::warn!("Unknown material '{name}'");
                }
                if self.current.indices.is_empty() {
                    self.current.material = material;
                } else {
                    let mesh_name = self.current.name.clone();
                    self.start_mesh(mesh_name, material);
                }
            }
            "mtllib" => {
                let mtl_path = self.base_dir.join(args.join(" "));
                match load_mtl(&mtl_path, self.base_dir) {
                    Ok(materials) => {
                        for material in materials {
                            self.material_ids
                                .insert(material.name.clone(), self.model.materials.len());
                            self.model.materials.push(material);
                        }
                    }
                    Err(e) => log::warn!("Skipping material library {}: {e:#}", mtl_path.display()),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn start_mesh(&mut self, name: String, material: Option<usize>) {
        let finished = std::mem::replace(&mut self.current, MeshBuilder::new(name, material));
        self.model.meshes.extend(finished.finish());
    }

    fn finish(mut self) -> Result<ObjModel> {
        let last = std::mem::replace(&mut self.current, MeshBuilder::new(String::new(), None));
        self.model.meshes.extend(last.finish());
        if self.model.meshes.is_empty() {
            bail!("no faces found");
        }
        Ok(self.model)
    }
}

pub fn parse_obj(reader: impl BufRead, base_dir: &Path, default_name: &str) -> Result<ObjModel> {
    let mut parser = ObjParser::new(base_dir, default_name);
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if let Some((keyword, args)) = tokens.split_first() {
            parser
                .line(keyword, args)
                .with_context(|| format!("line {}", line_number + 1))?;
        }
    }
    parser.finish()
}

fn load_mtl(path: &Path, base_dir: &Path) -> Result<Vec<MaterialData>> {
    let file = File::open(path)?;
    parse_mtl(BufReader::new(file), base_dir)
}

pub fn parse_mtl(reader: impl BufRead, base_dir: &Path) -> Result<Vec<MaterialData>> {
    let mut materials: Vec<MaterialData> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.split_first() {
            Some((&"newmtl", name)) => materials.push(MaterialData {
                name: name.join(" "),
                diffuse_texture: None,
            }),
            // Options such as `-bm 1` may precede the file name, which always comes last
            Some((&"map_Kd", args)) if !args.is_empty() => {
                if let Some(material) = materials.last_mut() {
                    let file = args[args.len() - 1].replace('\\', "/");
                    material.diffuse_texture = Some(base_dir.join(file));
                }
            }
            _ => {}
        }
    }
    Ok(materials)
}

pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

impl Model {
    pub fn load<P: AsRef<Path>>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: P,
        material_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("");

        if !extension.eq_ignore_ascii_case("obj") {
            return Err(ViewerError::UnsupportedModelFormat(extension.to_string()));
        }

        let data = ObjModel::load(path).map_err(|e| ViewerError::asset(path, e))?;
        Self::from_obj(device, queue, &data, material_bind_group_layout)
    }

    pub fn from_obj(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &ObjModel,
        material_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ViewerError> {
        let mut materials = data
            .materials
            .iter()
            .map(|material| {
                let texture = match &material.diffuse_texture {
                    Some(path) => Texture::from_path(device, queue, path, Some(&material.name))?,
                    None => Texture::solid_color(device, queue, [255; 4], Some(&material.name)),
                };
                Ok(Material::new(device, &material.name, texture, material_bind_group_layout))
            })
            .collect::<Result<Vec<_>, ViewerError>>()?;

        // Meshes without a material fall back to a plain white one at the end
        let fallback = materials.len();
        if data.meshes.iter().any(|m| m.material.is_none()) {
            let white = Texture::solid_color(device, queue, [255; 4], Some("default"));
            materials.push(Material::new(device, "default", white, material_bind_group_layout));
        }

        let meshes = data
            .meshes
            .iter()
            .map(|mesh| Mesh::new(device, mesh, mesh.material.unwrap_or(fallback)))
            .collect();

        log::debug!(
            "Model has {} meshes, {} materials",
            data.meshes.len(),
            materials.len()
        );

        Ok(Self { meshes, materials })
    }

    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            if let Some(material) = self.materials.get(mesh.material_index) {
                render_pass.set_bind_group(1, &material.bind_group, &[]);
            }
            mesh.render(render_pass);
        }
    }
}
