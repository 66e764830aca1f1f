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

//! Pure mapping from the Parquet schema tree to the output type system.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
use crate::errors::Result;
use crate::schema::types::{ColumnDescriptor, SchemaDescriptor, Type, TypePtr};

/// Convert the full Parquet schema into a [`Schema`], carrying the file's
/// key/value metadata along.
pub fn parquet_to_arrow_schema(
  descr: &SchemaDescriptor,
  key_value_metadata: Option<&HashMap<String, String>>
) -> Result<Schema> {
  let indices: Vec<usize> = (0..descr.num_columns()).collect();
  parquet_to_arrow_schema_by_columns(descr, &indices, key_value_metadata)
}

/// Convert the Parquet schema into a [`Schema`] restricted to the given
/// leaf column indices. A top-level field is present iff at least one of
/// its leaves is selected; unselected children of nested groups are
/// pruned the same way.
pub fn parquet_to_arrow_schema_by_columns(
  descr: &SchemaDescriptor,
  column_indices: &[usize],
  key_value_metadata: Option<&HashMap<String, String>>
) -> Result<Schema> {
  for &i in column_indices {
    if i >= descr.num_columns() {
      return Err(arg_err!(
        "Column index {} out of range: the schema has {} columns",
        i, descr.num_columns()));
    }
  }
  let selected: HashSet<usize> = column_indices.iter().cloned().collect();
  let mut leaf_counter = 0;
  let mut fields = vec![];
  for node in descr.root_schema().get_fields() {
    if let Some(field) = node_to_field(node, &selected, &mut leaf_counter)? {
      fields.push(field);
    }
  }
  let metadata = key_value_metadata.cloned().unwrap_or_default();
  Ok(Schema::new_with_metadata(fields, metadata))
}

/// Convert one leaf column into its output [`Field`].
pub fn parquet_to_arrow_field(column_descr: &ColumnDescriptor) -> Result<Field> {
  let node = column_descr.self_type();
  let data_type = primitive_to_data_type(
    column_descr.physical_type(),
    column_descr.logical_type(),
    column_descr.type_length())?;
  let nullable = node.get_basic_info().repetition() == Repetition::OPTIONAL;
  Ok(Field::new(node.name(), data_type, nullable))
}

/// Map leaf column indices to the indices of the top-level fields they
/// belong to, in schema order.
pub fn column_indices_to_field_indices(
  descr: &SchemaDescriptor,
  column_indices: &[usize]
) -> Result<Vec<usize>> {
  let mut field_indices = BTreeSet::new();
  for &i in column_indices {
    if i >= descr.num_columns() {
      return Err(arg_err!(
        "Column index {} out of range: the schema has {} columns",
        i, descr.num_columns()));
    }
    field_indices.insert(descr.get_column_root_idx(i));
  }
  Ok(field_indices.into_iter().collect())
}

fn primitive_to_data_type(
  physical_type: PhysicalType,
  logical_type: LogicalType,
  type_length: i32
) -> Result<DataType> {
  let result = match (physical_type, logical_type) {
    (PhysicalType::BOOLEAN, LogicalType::NONE) => DataType::Boolean,
    (PhysicalType::INT32, LogicalType::NONE) => DataType::Int32,
    (PhysicalType::INT32, LogicalType::INT_8) => DataType::Int8,
    (PhysicalType::INT32, LogicalType::INT_16) => DataType::Int16,
    (PhysicalType::INT32, LogicalType::INT_32) => DataType::Int32,
    (PhysicalType::INT32, LogicalType::UINT_8) => DataType::UInt8,
    (PhysicalType::INT32, LogicalType::UINT_16) => DataType::UInt16,
    (PhysicalType::INT32, LogicalType::UINT_32) => DataType::UInt32,
    (PhysicalType::INT32, LogicalType::DATE) => DataType::Date32,
    (PhysicalType::INT32, LogicalType::TIME_MILLIS) => DataType::Time32(TimeUnit::Millisecond),
    (PhysicalType::INT64, LogicalType::NONE) => DataType::Int64,
    (PhysicalType::INT64, LogicalType::INT_64) => DataType::Int64,
    (PhysicalType::INT64, LogicalType::UINT_64) => DataType::UInt64,
    (PhysicalType::INT64, LogicalType::TIMESTAMP_MILLIS) =>
      DataType::Timestamp(TimeUnit::Millisecond),
    (PhysicalType::INT64, LogicalType::TIMESTAMP_MICROS) =>
      DataType::Timestamp(TimeUnit::Microsecond),
    (PhysicalType::INT64, LogicalType::TIME_MICROS) => DataType::Time64(TimeUnit::Microsecond),
    (PhysicalType::INT96, LogicalType::NONE) => DataType::Timestamp(TimeUnit::Nanosecond),
    (PhysicalType::FLOAT, LogicalType::NONE) => DataType::Float32,
    (PhysicalType::DOUBLE, LogicalType::NONE) => DataType::Float64,
    (PhysicalType::BYTE_ARRAY, LogicalType::NONE) => DataType::Binary,
    (PhysicalType::BYTE_ARRAY, LogicalType::UTF8) => DataType::Utf8,
    (PhysicalType::BYTE_ARRAY, LogicalType::JSON) => DataType::Utf8,
    (PhysicalType::BYTE_ARRAY, LogicalType::BSON) => DataType::Binary,
    (PhysicalType::BYTE_ARRAY, LogicalType::ENUM) => DataType::Binary,
    (PhysicalType::FIXED_LEN_BYTE_ARRAY, LogicalType::NONE) =>
      DataType::FixedSizeBinary(type_length),
    (physical, logical) => {
      return Err(nyi_err!(
        "Reading {} columns annotated as {} is not supported", physical, logical));
    }
  };
  Ok(result)
}

// Walks one schema subtree, advancing the leaf counter over every leaf of
// the subtree whether selected or not.
fn node_to_field(
  node: &TypePtr,
  selected: &HashSet<usize>,
  leaf_counter: &mut usize
) -> Result<Option<Field>> {
  match node.as_ref() {
    Type::PrimitiveType { basic_info, physical_type, type_length, .. } => {
      let leaf_index = *leaf_counter;
      *leaf_counter += 1;
      if !selected.contains(&leaf_index) {
        return Ok(None);
      }
      let data_type =
        primitive_to_data_type(*physical_type, basic_info.logical_type(), *type_length)?;
      Ok(Some(Field::new(
        node.name(), data_type, basic_info.repetition() == Repetition::OPTIONAL)))
    },
    Type::GroupType { basic_info, fields } => {
      match basic_info.logical_type() {
        LogicalType::LIST => {
          let repeated_group = list_repeated_group(node)?;
          let element = &repeated_group.get_fields()[0];
          let element_field = node_to_field(element, selected, leaf_counter)?;
          Ok(element_field.map(|element_field| {
            Field::new(
              node.name(),
              DataType::List(Box::new(element_field)),
              basic_info.repetition() == Repetition::OPTIONAL)
          }))
        },
        LogicalType::MAP | LogicalType::MAP_KEY_VALUE => {
          let repeated_group = map_repeated_group(node)?;
          let mut entry_fields = vec![];
          for child in repeated_group.get_fields() {
            if let Some(field) = node_to_field(child, selected, leaf_counter)? {
              entry_fields.push(field);
            }
          }
          if entry_fields.is_empty() {
            return Ok(None);
          }
          let entry_field =
            Field::new(repeated_group.name(), DataType::Struct(entry_fields), false);
          Ok(Some(Field::new(
            node.name(),
            DataType::List(Box::new(entry_field)),
            basic_info.repetition() == Repetition::OPTIONAL)))
        },
        LogicalType::NONE => {
          if basic_info.has_repetition() && basic_info.repetition() == Repetition::REPEATED {
            return Err(nyi_err!(
              "Group {} is repeated but not annotated as LIST or MAP", node.name()));
          }
          let mut child_fields = vec![];
          for child in fields {
            if let Some(field) = node_to_field(child, selected, leaf_counter)? {
              child_fields.push(field);
            }
          }
          if child_fields.is_empty() {
            return Ok(None);
          }
          let nullable =
            basic_info.has_repetition() && basic_info.repetition() == Repetition::OPTIONAL;
          Ok(Some(Field::new(node.name(), DataType::Struct(child_fields), nullable)))
        },
        other => Err(nyi_err!("Group {} has unsupported logical type {}", node.name(), other))
      }
    }
  }
}

/// The single repeated group inside a LIST-annotated group; its single
/// child is the list element.
pub fn list_repeated_group(node: &TypePtr) -> Result<TypePtr> {
  let fields = node.get_fields();
  if fields.len() != 1 {
    return Err(nyi_err!(
      "LIST group {} must contain exactly one repeated group, found {} fields",
      node.name(), fields.len()));
  }
  let repeated_group = fields[0].clone();
  if !repeated_group.is_group()
    || repeated_group.get_basic_info().repetition() != Repetition::REPEATED
  {
    return Err(nyi_err!(
      "LIST group {} must contain a repeated group", node.name()));
  }
  if repeated_group.get_fields().len() != 1 {
    return Err(nyi_err!(
      "List element groups with more than one child are not supported (group {})",
      node.name()));
  }
  Ok(repeated_group)
}

/// The single repeated key/value group inside a MAP-annotated group.
pub fn map_repeated_group(node: &TypePtr) -> Result<TypePtr> {
  let fields = node.get_fields();
  if fields.len() != 1 {
    return Err(nyi_err!(
      "MAP group {} must contain exactly one repeated group, found {} fields",
      node.name(), fields.len()));
  }
  let repeated_group = fields[0].clone();
  if !repeated_group.is_group()
    || repeated_group.get_basic_info().repetition() != Repetition::REPEATED
  {
    return Err(nyi_err!(
      "MAP group {} must contain a repeated group", node.name()));
  }
  if repeated_group.get_fields().len() != 2 {
    return Err(nyi_err!(
      "MAP group {} must contain a repeated group with a key and a value, found {} fields",
      node.name(), repeated_group.get_fields().len()));
  }
  Ok(repeated_group)
}
