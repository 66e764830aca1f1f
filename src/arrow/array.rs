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

//! In-memory columnar arrays produced by the assembly layer.
//!
//! Arrays own their heap buffers through [`BytePtr`] and outlive the
//! assemblers that produced them. A validity bitmap is only materialized
//! when an array actually contains nulls.

use std::str;

use crate::arrow::datatypes::{DataType, Field, Schema};
use crate::util::bit_util;
use crate::util::memory::BytePtr;

/// A fixed-width primitive or boolean array. Boolean values are bit-packed.
#[derive(Debug, Clone)]
pub struct PrimitiveArray {
  data_type: DataType,
  length: usize,
  values: BytePtr,
  validity: Option<BytePtr>,
  null_count: usize
}

impl PrimitiveArray {
  pub fn new(
    data_type: DataType,
    length: usize,
    values: BytePtr,
    validity: Option<BytePtr>,
    null_count: usize
  ) -> Self {
    match data_type.primitive_width() {
      Some(width) => assert!(values.len() >= length * width),
      None => {
        assert_eq!(data_type, DataType::Boolean);
        assert!(values.len() >= bit_util::bytes_for_bits(length));
      }
    }
    if let Some(ref bitmap) = validity {
      assert!(bitmap.len() >= bit_util::bytes_for_bits(length));
    }
    PrimitiveArray { data_type, length, values, validity, null_count }
  }

  /// Values viewed as native values of `T`. Panics for boolean arrays.
  pub fn typed_values<T: Copy>(&self) -> &[T] {
    let width = self.data_type.primitive_width()
      .expect("typed_values() is not supported for this data type");
    assert_eq!(width, std::mem::size_of::<T>());
    &self.values.typed::<T>()[..self.length]
  }

  /// The `i`th value of a boolean array.
  pub fn bool_value(&self, i: usize) -> bool {
    assert_eq!(self.data_type, DataType::Boolean);
    assert!(i < self.length);
    bit_util::get_array_bit(self.values.as_ref(), i)
  }

  pub fn values(&self) -> &BytePtr {
    &self.values
  }
}

/// A variable-length (`Utf8`/`Binary`) or fixed-width (`FixedSizeBinary`)
/// byte array. Variable-length arrays carry `length + 1` offsets into the
/// value buffer.
#[derive(Debug, Clone)]
pub struct BinaryArray {
  data_type: DataType,
  length: usize,
  offsets: Option<BytePtr>,
  values: BytePtr,
  validity: Option<BytePtr>,
  null_count: usize
}

impl BinaryArray {
  pub fn new(
    data_type: DataType,
    length: usize,
    offsets: Option<BytePtr>,
    values: BytePtr,
    validity: Option<BytePtr>,
    null_count: usize
  ) -> Self {
    match data_type {
      DataType::Utf8 | DataType::Binary => {
        let offsets = offsets.as_ref().expect("variable-length arrays carry offsets");
        assert_eq!(offsets.typed::<i32>().len(), length + 1);
      },
      DataType::FixedSizeBinary(width) => {
        assert!(offsets.is_none());
        assert!(values.len() >= length * width as usize);
      },
      ref other => panic!("BinaryArray does not support {}", other)
    }
    if let Some(ref bitmap) = validity {
      assert!(bitmap.len() >= bit_util::bytes_for_bits(length));
    }
    BinaryArray { data_type, length, offsets, values, validity, null_count }
  }

  pub fn value_offsets(&self) -> &[i32] {
    self.offsets.as_ref()
      .expect("fixed-size binary arrays have no offsets")
      .typed::<i32>()
  }

  pub fn value(&self, i: usize) -> &[u8] {
    assert!(i < self.length);
    match self.data_type {
      DataType::FixedSizeBinary(width) => {
        let width = width as usize;
        &self.values.as_ref()[i * width..(i + 1) * width]
      },
      _ => {
        let offsets = self.value_offsets();
        &self.values.as_ref()[offsets[i] as usize..offsets[i + 1] as usize]
      }
    }
  }

  /// The `i`th value as a string slice; the array must hold valid UTF-8.
  pub fn str_value(&self, i: usize) -> &str {
    str::from_utf8(self.value(i)).expect("invalid UTF-8 in Utf8 array")
  }
}

/// A variable-length list array: `length + 1` offsets into one child array.
#[derive(Debug, Clone)]
pub struct ListArray {
  data_type: DataType,
  length: usize,
  offsets: BytePtr,
  values: Box<Array>,
  validity: Option<BytePtr>,
  null_count: usize
}

impl ListArray {
  pub fn new(
    data_type: DataType,
    length: usize,
    offsets: BytePtr,
    values: Box<Array>,
    validity: Option<BytePtr>,
    null_count: usize
  ) -> Self {
    assert!(matches!(data_type, DataType::List(_)));
    let offset_values = offsets.typed::<i32>();
    assert_eq!(offset_values.len(), length + 1);
    assert_eq!(offset_values[length] as usize, values.len());
    if let Some(ref bitmap) = validity {
      assert!(bitmap.len() >= bit_util::bytes_for_bits(length));
    }
    ListArray { data_type, length, offsets, values, validity, null_count }
  }

  pub fn value_offsets(&self) -> &[i32] {
    self.offsets.typed::<i32>()
  }

  /// The child array holding the concatenated list elements.
  pub fn values(&self) -> &Array {
    &self.values
  }

  /// Length of the `i`th list.
  pub fn value_length(&self, i: usize) -> i32 {
    let offsets = self.value_offsets();
    offsets[i + 1] - offsets[i]
  }
}

/// A struct array: sibling child arrays of equal length.
#[derive(Debug, Clone)]
pub struct StructArray {
  data_type: DataType,
  length: usize,
  children: Vec<Array>,
  validity: Option<BytePtr>,
  null_count: usize
}

impl StructArray {
  pub fn new(
    data_type: DataType,
    length: usize,
    children: Vec<Array>,
    validity: Option<BytePtr>,
    null_count: usize
  ) -> Self {
    assert!(matches!(data_type, DataType::Struct(_)));
    for child in &children {
      assert_eq!(child.len(), length);
    }
    if let Some(ref bitmap) = validity {
      assert!(bitmap.len() >= bit_util::bytes_for_bits(length));
    }
    StructArray { data_type, length, children, validity, null_count }
  }

  pub fn num_children(&self) -> usize {
    self.children.len()
  }

  pub fn child(&self, i: usize) -> &Array {
    &self.children[i]
  }

  pub fn children(&self) -> &[Array] {
    &self.children
  }
}

/// An output array of any supported shape.
#[derive(Debug, Clone)]
pub enum Array {
  Primitive(PrimitiveArray),
  Binary(BinaryArray),
  List(ListArray),
  Struct(StructArray)
}

impl Array {
  pub fn data_type(&self) -> &DataType {
    match *self {
      Array::Primitive(ref a) => &a.data_type,
      Array::Binary(ref a) => &a.data_type,
      Array::List(ref a) => &a.data_type,
      Array::Struct(ref a) => &a.data_type
    }
  }

  pub fn len(&self) -> usize {
    match *self {
      Array::Primitive(ref a) => a.length,
      Array::Binary(ref a) => a.length,
      Array::List(ref a) => a.length,
      Array::Struct(ref a) => a.length
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn null_count(&self) -> usize {
    match *self {
      Array::Primitive(ref a) => a.null_count,
      Array::Binary(ref a) => a.null_count,
      Array::List(ref a) => a.null_count,
      Array::Struct(ref a) => a.null_count
    }
  }

  pub fn validity(&self) -> Option<&BytePtr> {
    match *self {
      Array::Primitive(ref a) => a.validity.as_ref(),
      Array::Binary(ref a) => a.validity.as_ref(),
      Array::List(ref a) => a.validity.as_ref(),
      Array::Struct(ref a) => a.validity.as_ref()
    }
  }

  /// Whether position `i` is non-null. Arrays without a validity bitmap
  /// have no nulls.
  pub fn is_valid(&self, i: usize) -> bool {
    assert!(i < self.len());
    match self.validity() {
      Some(bitmap) => bit_util::get_array_bit(bitmap.as_ref(), i),
      None => true
    }
  }

  pub fn as_primitive(&self) -> &PrimitiveArray {
    match *self {
      Array::Primitive(ref a) => a,
      _ => panic!("not a primitive array")
    }
  }

  pub fn as_binary(&self) -> &BinaryArray {
    match *self {
      Array::Binary(ref a) => a,
      _ => panic!("not a binary array")
    }
  }

  pub fn as_list(&self) -> &ListArray {
    match *self {
      Array::List(ref a) => a,
      _ => panic!("not a list array")
    }
  }

  pub fn as_struct(&self) -> &StructArray {
    match *self {
      Array::Struct(ref a) => a,
      _ => panic!("not a struct array")
    }
  }
}

/// Build a length-0 array of the given type.
pub fn new_empty_array(data_type: &DataType) -> Array {
  match *data_type {
    DataType::Boolean => Array::Primitive(PrimitiveArray::new(
      data_type.clone(), 0, BytePtr::new(vec![]), None, 0)),
    DataType::Utf8 | DataType::Binary => Array::Binary(BinaryArray::new(
      data_type.clone(), 0, Some(BytePtr::new(vec![0; 4])), BytePtr::new(vec![]), None, 0)),
    DataType::FixedSizeBinary(_) => Array::Binary(BinaryArray::new(
      data_type.clone(), 0, None, BytePtr::new(vec![]), None, 0)),
    DataType::List(ref field) => Array::List(ListArray::new(
      data_type.clone(), 0, BytePtr::new(vec![0; 4]),
      Box::new(new_empty_array(field.data_type())), None, 0)),
    DataType::Struct(ref fields) => Array::Struct(StructArray::new(
      data_type.clone(), 0,
      fields.iter().map(|f| new_empty_array(f.data_type())).collect(), None, 0)),
    _ => Array::Primitive(PrimitiveArray::new(
      data_type.clone(), 0, BytePtr::new(vec![]), None, 0))
  }
}

/// A set of equal-length columns bound to a schema.
#[derive(Debug)]
pub struct Table {
  schema: Schema,
  columns: Vec<Array>
}

impl Table {
  pub fn new(schema: Schema, columns: Vec<Array>) -> Self {
    assert_eq!(schema.num_fields(), columns.len());
    if let Some(first) = columns.first() {
      for column in &columns {
        assert_eq!(column.len(), first.len());
      }
    }
    Table { schema, columns }
  }

  pub fn schema(&self) -> &Schema {
    &self.schema
  }

  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  pub fn num_rows(&self) -> usize {
    self.columns.first().map(|c| c.len()).unwrap_or(0)
  }

  pub fn column(&self, i: usize) -> &Array {
    &self.columns[i]
  }

  pub fn field_by_name(&self, name: &str) -> Option<(&Field, &Array)> {
    self.schema.fields().iter().position(|f| f.name() == name)
      .map(|i| (self.schema.field(i), &self.columns[i]))
  }
}
