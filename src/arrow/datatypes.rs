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

//! The target columnar type system that leaf columns are assembled into.

use std::collections::HashMap;
use std::fmt;

/// Time granularity of timestamp and time types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
  Millisecond,
  Microsecond,
  Nanosecond
}

/// Logical type of an output array.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
  Boolean,
  Int8,
  Int16,
  Int32,
  Int64,
  UInt8,
  UInt16,
  UInt32,
  UInt64,
  Float32,
  Float64,
  /// Days since the Unix epoch, 32 bits.
  Date32,
  /// Milliseconds since the Unix epoch, 64 bits.
  Date64,
  Timestamp(TimeUnit),
  Time32(TimeUnit),
  Time64(TimeUnit),
  Utf8,
  Binary,
  FixedSizeBinary(i32),
  List(Box<Field>),
  Struct(Vec<Field>)
}

impl DataType {
  /// Width in bytes of one value for fixed-width primitive types; `None`
  /// for boolean (bit-packed), variable-length and nested types.
  pub fn primitive_width(&self) -> Option<usize> {
    match *self {
      DataType::Int8 | DataType::UInt8 => Some(1),
      DataType::Int16 | DataType::UInt16 => Some(2),
      DataType::Int32 | DataType::UInt32 | DataType::Float32 | DataType::Date32 |
      DataType::Time32(_) => Some(4),
      DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Date64 |
      DataType::Timestamp(_) | DataType::Time64(_) => Some(8),
      _ => None
    }
  }

  pub fn is_nested(&self) -> bool {
    matches!(*self, DataType::List(_) | DataType::Struct(_))
  }
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// A named, typed field of a schema or of a nested type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
  name: String,
  data_type: DataType,
  nullable: bool
}

impl Field {
  pub fn new(name: &str, data_type: DataType, nullable: bool) -> Self {
    Field { name: String::from(name), data_type, nullable }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn data_type(&self) -> &DataType {
    &self.data_type
  }

  pub fn is_nullable(&self) -> bool {
    self.nullable
  }
}

/// An ordered collection of top-level fields with optional key/value
/// metadata carried over from the file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
  fields: Vec<Field>,
  metadata: HashMap<String, String>
}

impl Schema {
  pub fn new(fields: Vec<Field>) -> Self {
    Schema { fields, metadata: HashMap::new() }
  }

  pub fn new_with_metadata(fields: Vec<Field>, metadata: HashMap<String, String>) -> Self {
    Schema { fields, metadata }
  }

  pub fn fields(&self) -> &[Field] {
    &self.fields
  }

  pub fn field(&self, i: usize) -> &Field {
    &self.fields[i]
  }

  pub fn num_fields(&self) -> usize {
    self.fields.len()
  }

  pub fn metadata(&self) -> &HashMap<String, String> {
    &self.metadata
  }
}
