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

use crate::data_type::*;
use crate::errors::Result;

/// A value reader for one column chunk of a particular primitive column.
///
/// Implementations live in the physical layer (page decoding, dictionary
/// and level decoding); this crate only consumes the decoded stream.
pub trait TypedColumnReader<T: DataType> {
  /// Read up to `batch_size` level entries from the chunk, in physical
  /// order.
  ///
  /// Values are written densely into `values`: only entries whose
  /// definition level equals the column's max definition level carry a
  /// value. Definition levels are written to `def_levels` when the column
  /// has any (`max_def_level > 0`), repetition levels to `rep_levels` when
  /// the column is inside a repeated context (`max_rep_level > 0`); both
  /// slices, when provided, receive one entry per level entry read.
  ///
  /// Returns `(levels_read, values_read)`. `levels_read < batch_size`
  /// means the chunk ran out of data; for columns without levels,
  /// `levels_read == values_read`.
  fn read_batch(
    &mut self,
    batch_size: usize,
    def_levels: Option<&mut [i16]>,
    rep_levels: Option<&mut [i16]>,
    values: &mut [T::T]
  ) -> Result<(usize, usize)>;

  /// Like [`read_batch`](Self::read_batch), but writes each value into its
  /// final slot: entry `i` of the batch goes to `values[i]`, and bit
  /// `valid_bits_offset + i` of `valid_bits` is set iff the entry carries
  /// a value. Slots for absent values are left untouched.
  ///
  /// Only meaningful for columns without repeated ancestors, where every
  /// level entry corresponds to exactly one output slot.
  ///
  /// Returns `(levels_read, values_read, null_count)` where `values_read`
  /// counts the non-null values written.
  fn read_batch_spaced(
    &mut self,
    batch_size: usize,
    def_levels: &mut [i16],
    rep_levels: Option<&mut [i16]>,
    values: &mut [T::T],
    valid_bits: &mut [u8],
    valid_bits_offset: usize
  ) -> Result<(usize, usize, usize)>;

  /// Whether the chunk has more level entries to read.
  fn has_next(&self) -> bool;
}

/// Column reader for a specific physical column, tagged by type.
pub enum ColumnReader {
  BoolColumnReader(Box<dyn TypedColumnReader<BoolType>>),
  Int32ColumnReader(Box<dyn TypedColumnReader<Int32Type>>),
  Int64ColumnReader(Box<dyn TypedColumnReader<Int64Type>>),
  Int96ColumnReader(Box<dyn TypedColumnReader<Int96Type>>),
  FloatColumnReader(Box<dyn TypedColumnReader<FloatType>>),
  DoubleColumnReader(Box<dyn TypedColumnReader<DoubleType>>),
  ByteArrayColumnReader(Box<dyn TypedColumnReader<ByteArrayType>>),
  FixedLenByteArrayColumnReader(Box<dyn TypedColumnReader<FixedLenByteArrayType>>)
}

/// Get the typed reader out of a [`ColumnReader`]. Fails when the tag does
/// not match `T`'s physical type.
pub fn get_typed_column_reader<T: DataType>(
  column_reader: ColumnReader
) -> Result<Box<dyn TypedColumnReader<T>>> {
  T::get_column_reader(column_reader).ok_or_else(|| {
    invalid_err!(
      "Failed to convert column reader into a typed column reader for `{}` type",
      T::get_physical_type())
  })
}
