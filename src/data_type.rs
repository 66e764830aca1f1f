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

use std::fmt;
use std::mem;

use crate::basic::Type;
use crate::column::reader::{ColumnReader, TypedColumnReader};
use crate::util::memory::BytePtr;

// ----------------------------------------------------------------------
// Types connecting Parquet physical types with Rust-specific types

const JULIAN_TO_UNIX_EPOCH_DAYS: i64 = 2_440_588;
const NANOSECONDS_IN_A_DAY: i64 = 86_400_000_000_000;

/// A 96-bit Impala/Hive timestamp: nanoseconds within the day in the low
/// 64 bits, Julian day in the high 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Int96 {
  value: [u32; 3]
}

impl Int96 {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn data(&self) -> &[u32] {
    &self.value
  }

  pub fn set_data(&mut self, elem0: u32, elem1: u32, elem2: u32) {
    self.value = [elem0, elem1, elem2];
  }

  /// Nanoseconds since the Unix epoch.
  pub fn to_nanos(&self) -> i64 {
    let days_since_epoch = self.value[2] as i64 - JULIAN_TO_UNIX_EPOCH_DAYS;
    let nanos_of_day = ((self.value[1] as u64) << 32 | self.value[0] as u64) as i64;
    days_since_epoch * NANOSECONDS_IN_A_DAY + nanos_of_day
  }
}

impl From<[u32; 3]> for Int96 {
  fn from(value: [u32; 3]) -> Self {
    Int96 { value }
  }
}

/// A variable-length byte array value, backed by a reference-counted
/// slice of the chunk it was decoded from.
#[derive(Clone, Debug, Default)]
pub struct ByteArray {
  data: Option<BytePtr>
}

impl ByteArray {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    assert!(self.data.is_some());
    self.data.as_ref().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn data(&self) -> &[u8] {
    assert!(self.data.is_some());
    self.data.as_ref().unwrap().as_ref()
  }

  pub fn set_data(&mut self, data: BytePtr) {
    self.data = Some(data);
  }
}

impl From<Vec<u8>> for ByteArray {
  fn from(buf: Vec<u8>) -> Self {
    ByteArray { data: Some(BytePtr::new(buf)) }
  }
}

impl From<&str> for ByteArray {
  fn from(s: &str) -> Self {
    ByteArray::from(s.as_bytes().to_vec())
  }
}

impl PartialEq for ByteArray {
  fn eq(&self, other: &ByteArray) -> bool {
    self.data() == other.data()
  }
}

/// Connects a Parquet physical type with its in-memory value type, and
/// provides the hook for extracting the matching typed reader out of a
/// type-tagged [`ColumnReader`].
pub trait DataType: 'static {
  type T: PartialEq + fmt::Debug + Default + Clone + Send;

  fn get_physical_type() -> Type;

  fn get_type_size() -> usize;

  fn get_column_reader(column_reader: ColumnReader) -> Option<Box<dyn TypedColumnReader<Self>>>
  where Self: Sized;
}

macro_rules! make_type {
  ($name:ident, $reader_ident:ident, $physical_ty:path, $native_ty:ty, $size:expr) => {
    pub struct $name {}

    impl DataType for $name {
      type T = $native_ty;

      fn get_physical_type() -> Type {
        $physical_ty
      }

      fn get_type_size() -> usize {
        $size
      }

      fn get_column_reader(
        column_reader: ColumnReader
      ) -> Option<Box<dyn TypedColumnReader<Self>>> {
        match column_reader {
          ColumnReader::$reader_ident(r) => Some(r),
          _ => None
        }
      }
    }
  };
}

// Generate struct definitions for all physical types

make_type!(BoolType, BoolColumnReader, Type::BOOLEAN, bool, 1);
make_type!(Int32Type, Int32ColumnReader, Type::INT32, i32, 4);
make_type!(Int64Type, Int64ColumnReader, Type::INT64, i64, 8);
make_type!(Int96Type, Int96ColumnReader, Type::INT96, Int96, mem::size_of::<Int96>());
make_type!(FloatType, FloatColumnReader, Type::FLOAT, f32, 4);
make_type!(DoubleType, DoubleColumnReader, Type::DOUBLE, f64, 8);
make_type!(ByteArrayType, ByteArrayColumnReader, Type::BYTE_ARRAY,
           ByteArray, mem::size_of::<ByteArray>());
make_type!(FixedLenByteArrayType, FixedLenByteArrayColumnReader, Type::FIXED_LEN_BYTE_ARRAY,
           ByteArray, mem::size_of::<ByteArray>());
