// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
use crate::errors::Result;

// ----------------------------------------------------------------------
// Parquet type definitions

pub type TypePtr = Arc<Type>;
pub type SchemaDescPtr = Arc<SchemaDescriptor>;
pub type ColumnDescPtr = Arc<ColumnDescriptor>;

/// Representation of a Parquet schema type. The top-level schema type is
/// represented using `GroupType` whose repetition is `None`.
#[derive(Debug, PartialEq)]
pub enum Type {
  PrimitiveType {
    basic_info: BasicTypeInfo,
    physical_type: PhysicalType,
    type_length: i32,
    scale: i32,
    precision: i32
  },
  GroupType {
    basic_info: BasicTypeInfo,
    fields: Vec<TypePtr>
  }
}

impl Type {
  /// Create a new `PrimitiveType` instance from the input parameters.
  /// This also checks various illegal conditions and returns `Err` in case
  /// that happens.
  pub fn new_primitive_type(
    name: &str,
    repetition: Repetition,
    physical_type: PhysicalType,
    logical_type: LogicalType,
    length: i32,
    precision: i32,
    scale: i32
  ) -> Result<Type> {
    let basic_info = BasicTypeInfo {
      name: String::from(name),
      repetition: Some(repetition),
      logical_type
    };

    match logical_type {
      LogicalType::NONE => {},
      LogicalType::UTF8 | LogicalType::BSON | LogicalType::JSON | LogicalType::ENUM => {
        if physical_type != PhysicalType::BYTE_ARRAY {
          return Err(arg_err!("{} can only annotate BYTE_ARRAY fields", logical_type));
        }
      },
      LogicalType::DECIMAL => {
        match physical_type {
          PhysicalType::INT32 | PhysicalType::INT64 | PhysicalType::BYTE_ARRAY |
          PhysicalType::FIXED_LEN_BYTE_ARRAY => (),
          _ => {
            return Err(arg_err!("DECIMAL can only annotate INT32, INT64, BYTE_ARRAY and FIXED"));
          }
        };
        if precision < 0 {
          return Err(arg_err!("Invalid DECIMAL precision: {}", precision));
        }
        if scale < 0 {
          return Err(arg_err!("Invalid DECIMAL scale: {}", scale));
        }
        if scale > precision {
          return Err(arg_err!(
            "Invalid DECIMAL: scale ({}) cannot be greater than precision ({})",
            scale, precision));
        }
      },
      LogicalType::DATE | LogicalType::TIME_MILLIS | LogicalType::UINT_8 |
      LogicalType::UINT_16 | LogicalType::UINT_32 |
      LogicalType::INT_8 | LogicalType::INT_16 | LogicalType::INT_32 => {
        if physical_type != PhysicalType::INT32 {
          return Err(arg_err!("{} can only annotate INT32", logical_type));
        }
      },
      LogicalType::TIME_MICROS | LogicalType::TIMESTAMP_MILLIS |
      LogicalType::TIMESTAMP_MICROS | LogicalType::UINT_64 | LogicalType::INT_64 => {
        if physical_type != PhysicalType::INT64 {
          return Err(arg_err!("{} can only annotate INT64", logical_type));
        }
      },
      LogicalType::INTERVAL => {
        if physical_type != PhysicalType::FIXED_LEN_BYTE_ARRAY || length != 12 {
          return Err(arg_err!("INTERVAL can only annotate FIXED(12)"));
        }
      },
      _ => {
        return Err(arg_err!("{} cannot be applied to a primitive type", logical_type));
      }
    };
    if physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && length < 0 {
      return Err(arg_err!("Invalid FIXED_LEN_BYTE_ARRAY length: {}", length));
    }
    Ok(Type::PrimitiveType {
      basic_info,
      physical_type,
      type_length: length,
      scale,
      precision
    })
  }

  /// Create a new `GroupType` instance from the input parameters.
  pub fn new_group_type(
    name: &str,
    repetition: Option<Repetition>,
    logical_type: LogicalType,
    fields: Vec<TypePtr>
  ) -> Result<Type> {
    let basic_info = BasicTypeInfo {
      name: String::from(name),
      repetition,
      logical_type
    };
    Ok(Type::GroupType { basic_info, fields })
  }

  pub fn get_basic_info(&self) -> &BasicTypeInfo {
    match *self {
      Type::PrimitiveType { ref basic_info, .. } => basic_info,
      Type::GroupType { ref basic_info, .. } => basic_info
    }
  }

  pub fn name(&self) -> &str {
    self.get_basic_info().name()
  }

  /// Get the fields from this group type.
  /// NOTE: this will panic if called on a non-group type.
  pub fn get_fields(&self) -> &[TypePtr] {
    match *self {
      Type::GroupType { ref fields, .. } => &fields[..],
      _ => panic!("Cannot call get_fields() on a non-group type")
    }
  }

  /// Physical type of this primitive type.
  /// NOTE: this will panic if called on a non-primitive type.
  pub fn get_physical_type(&self) -> PhysicalType {
    match *self {
      Type::PrimitiveType { physical_type, .. } => physical_type,
      _ => panic!("Cannot call get_physical_type() on a non-primitive type")
    }
  }

  pub fn is_primitive(&self) -> bool {
    matches!(*self, Type::PrimitiveType { .. })
  }

  pub fn is_group(&self) -> bool {
    matches!(*self, Type::GroupType { .. })
  }

  /// Whether this is the top-level schema type (message type).
  pub fn is_schema(&self) -> bool {
    match *self {
      Type::GroupType { ref basic_info, .. } => !basic_info.has_repetition(),
      _ => false
    }
  }
}

/// Basic type info. This contains information such as the name of the type,
/// the repetition level and the logical type.
#[derive(Debug, PartialEq)]
pub struct BasicTypeInfo {
  name: String,
  repetition: Option<Repetition>,
  logical_type: LogicalType
}

impl BasicTypeInfo {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn has_repetition(&self) -> bool {
    self.repetition.is_some()
  }

  pub fn repetition(&self) -> Repetition {
    assert!(self.repetition.is_some());
    self.repetition.unwrap()
  }

  pub fn logical_type(&self) -> LogicalType {
    self.logical_type
  }
}

// ----------------------------------------------------------------------
// Parquet descriptor definitions

/// Represents a path in a nested schema.
#[derive(Clone, PartialEq, Debug)]
pub struct ColumnPath {
  parts: Vec<String>
}

impl ColumnPath {
  pub fn new(parts: Vec<String>) -> Self {
    ColumnPath { parts }
  }

  pub fn string(&self) -> String {
    self.parts.join(".")
  }
}

impl fmt::Display for ColumnPath {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self.string())
  }
}

/// A descriptor for leaf-level primitive columns. This encapsulates
/// information such as definition and repetition levels and is used to
/// re-assemble nested data.
pub struct ColumnDescriptor {
  // The "leaf" primitive type of this column
  primitive_type: TypePtr,

  // The root type of this column. For instance, if the column is
  // "a.b.c.d", then the primitive type is 'd' while the root type is 'a'.
  root_type: TypePtr,

  // The maximum definition level for this column
  max_def_level: i16,

  // The maximum repetition level for this column
  max_rep_level: i16,

  // The definition level of the nearest repeated node on the path to this
  // column (the column itself included), or 0 if there is none. A level
  // entry produces an output slot iff its definition level reaches this
  // bound; below it the enclosing list has no element here at all.
  min_space_def_level: i16,

  // The path of this column. For instance, "a.b.c.d".
  path: ColumnPath
}

impl ColumnDescriptor {
  // Ctor is private outside of this module - should be created
  // via `SchemaDescriptor`.
  fn new(
    primitive_type: TypePtr,
    root_type: TypePtr,
    max_def_level: i16,
    max_rep_level: i16,
    min_space_def_level: i16,
    path: ColumnPath
  ) -> Self {
    Self { primitive_type, root_type, max_def_level, max_rep_level, min_space_def_level, path }
  }

  pub fn max_def_level(&self) -> i16 {
    self.max_def_level
  }

  pub fn max_rep_level(&self) -> i16 {
    self.max_rep_level
  }

  pub fn min_space_def_level(&self) -> i16 {
    self.min_space_def_level
  }

  pub fn path(&self) -> &ColumnPath {
    &self.path
  }

  pub fn self_type(&self) -> &Type {
    self.primitive_type.as_ref()
  }

  pub fn self_type_ptr(&self) -> TypePtr {
    self.primitive_type.clone()
  }

  pub fn root_type(&self) -> &Type {
    self.root_type.as_ref()
  }

  pub fn name(&self) -> &str {
    self.primitive_type.name()
  }

  pub fn logical_type(&self) -> LogicalType {
    self.primitive_type.get_basic_info().logical_type()
  }

  pub fn physical_type(&self) -> PhysicalType {
    match self.primitive_type.as_ref() {
      Type::PrimitiveType { physical_type, .. } => *physical_type,
      _ => panic!("Expected primitive type!")
    }
  }

  pub fn type_length(&self) -> i32 {
    match self.primitive_type.as_ref() {
      Type::PrimitiveType { type_length, .. } => *type_length,
      _ => panic!("Expected primitive type!")
    }
  }
}

/// A schema descriptor. This encapsulates the top-level schema for all the
/// columns, as well as descriptors for all the primitive columns, indexed
/// in depth-first order.
pub struct SchemaDescriptor {
  // The top-level schema (the "message" type).
  // This must be a `GroupType` where each field is a root column type.
  schema: TypePtr,

  // All the descriptors for primitive columns in this schema, constructed
  // from `schema` in DFS order.
  leaves: Vec<ColumnDescPtr>,

  // Mapping from a leaf column index to the index of the top-level field
  // it belongs to. For instance, the leaf `a.b.c.d` links back to `a`.
  leaf_to_base: HashMap<usize, usize>
}

impl SchemaDescriptor {
  pub fn new(tp: TypePtr) -> Self {
    assert!(tp.is_group(), "SchemaDescriptor should take a GroupType");
    let mut leaves = vec![];
    let mut leaf_to_base = HashMap::new();
    for (root_idx, f) in tp.get_fields().iter().enumerate() {
      let mut path = vec![];
      build_tree(f, f, root_idx, 0, 0, 0, &mut leaves, &mut leaf_to_base, &mut path);
    }
    Self { schema: tp, leaves, leaf_to_base }
  }

  pub fn column(&self, i: usize) -> ColumnDescPtr {
    assert!(
      i < self.leaves.len(),
      "Index out of bound: {} not in [0, {})", i, self.leaves.len());
    self.leaves[i].clone()
  }

  pub fn columns(&self) -> &[ColumnDescPtr] {
    &self.leaves
  }

  pub fn num_columns(&self) -> usize {
    self.leaves.len()
  }

  /// Index of the top-level field that leaf column `i` belongs to.
  pub fn get_column_root_idx(&self, i: usize) -> usize {
    assert!(
      i < self.leaves.len(),
      "Index out of bound: {} not in [0, {})", i, self.leaves.len());
    *self.leaf_to_base.get(&i)
      .unwrap_or_else(|| panic!("Expected a value for index {} but found None", i))
  }

  pub fn get_column_root(&self, i: usize) -> &Type {
    self.schema.get_fields()[self.get_column_root_idx(i)].as_ref()
  }

  pub fn root_schema(&self) -> &Type {
    self.schema.as_ref()
  }

  pub fn root_schema_ptr(&self) -> TypePtr {
    self.schema.clone()
  }

  pub fn name(&self) -> &str {
    self.schema.name()
  }
}

fn build_tree(
  tp: &TypePtr,
  base_tp: &TypePtr,
  root_idx: usize,
  mut max_def_level: i16,
  mut max_rep_level: i16,
  mut min_space_def_level: i16,
  leaves: &mut Vec<ColumnDescPtr>,
  leaf_to_base: &mut HashMap<usize, usize>,
  path_so_far: &mut Vec<String>
) {
  assert!(tp.get_basic_info().has_repetition());

  path_so_far.push(String::from(tp.name()));
  match tp.get_basic_info().repetition() {
    Repetition::REQUIRED => {},
    Repetition::OPTIONAL => {
      max_def_level += 1;
    },
    Repetition::REPEATED => {
      max_def_level += 1;
      max_rep_level += 1;
      min_space_def_level = max_def_level;
    }
  }

  match tp.as_ref() {
    Type::PrimitiveType { .. } => {
      let path: Vec<String> = path_so_far.clone();
      leaves.push(Arc::new(ColumnDescriptor::new(
        tp.clone(), base_tp.clone(), max_def_level, max_rep_level,
        min_space_def_level, ColumnPath::new(path))));
      leaf_to_base.insert(leaves.len() - 1, root_idx);
    },
    Type::GroupType { ref fields, .. } => {
      for f in fields {
        build_tree(
          f, base_tp, root_idx, max_def_level, max_rep_level,
          min_space_def_level, leaves, leaf_to_base, path_so_far);
        path_so_far.pop();
      }
    }
  }
}
