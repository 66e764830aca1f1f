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

//! The assembler tree turning shredded leaf columns into arrays.
//!
//! An [`ArrayReader`] produces up to `batch_size` output rows per call and
//! exposes the definition/repetition level streams it saw, so that an
//! enclosing list or struct reader can synthesize offsets and validity
//! from its children. The tree is built by [`build_array_reader`] and is
//! isomorphic to the selected subtree of the file schema.

use std::cmp;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::marker::PhantomData;
use std::mem;
use std::slice;
use std::sync::Arc;

use crate::arrow::array::{
  Array, BinaryArray, ListArray, PrimitiveArray, StructArray
};
use crate::arrow::datatypes::{DataType, Field, TimeUnit};
use crate::arrow::schema::{
  list_repeated_group, map_repeated_group, parquet_to_arrow_field
};
use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
use crate::column::reader::{get_typed_column_reader, TypedColumnReader};
use crate::data_type::DataType as PhysicalDataType;
use crate::data_type::*;
use crate::errors::Result;
use crate::file::reader::FileReader;
use crate::schema::types::{ColumnDescPtr, Type, TypePtr};
use crate::util::bit_util;
use crate::util::memory::{ByteBuffer, MemoryPoolPtr};

/// One node of the assembler tree.
pub trait ArrayReader {
  fn data_type(&self) -> &DataType;

  /// Produce up to `batch_size` output rows. Returns `None` iff the
  /// underlying column chunks are exhausted.
  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>>;

  /// The definition levels observed while producing the last batch. Empty
  /// for columns that cannot be null (`max_def_level() == 0`).
  fn get_def_levels(&self) -> &[i16];

  /// The repetition levels observed while producing the last batch. Empty
  /// outside of repeated context (`max_rep_level() == 0`).
  fn get_rep_levels(&self) -> &[i16];

  fn max_def_level(&self) -> i16;

  fn max_rep_level(&self) -> i16;
}

// ----------------------------------------------------------------------
// Row group iteration

/// Steps one leaf column across column chunks, either through all row
/// groups of the file or through a single one.
pub struct FileColumnIterator {
  column_index: usize,
  reader: Arc<dyn FileReader>,
  next_row_group: usize,
  end_row_group: usize
}

impl FileColumnIterator {
  pub fn new(
    column_index: usize,
    reader: Arc<dyn FileReader>,
    row_group: Option<usize>
  ) -> Self {
    let (next_row_group, end_row_group) = match row_group {
      Some(i) => (i, i + 1),
      None => (0, reader.metadata().num_row_groups())
    };
    FileColumnIterator { column_index, reader, next_row_group, end_row_group }
  }

  /// The next column chunk, or `None` once all row groups are consumed.
  pub fn next(&mut self) -> Result<Option<crate::column::reader::ColumnReader>> {
    if self.next_row_group >= self.end_row_group {
      return Ok(None);
    }
    let row_group = self.reader.get_row_group(self.next_row_group)?;
    self.next_row_group += 1;
    Ok(Some(row_group.get_column_reader(self.column_index)?))
  }

  pub fn descr(&self) -> ColumnDescPtr {
    self.reader.metadata().file_metadata().schema_descr().column(self.column_index)
  }

  pub fn column_index(&self) -> usize {
    self.column_index
  }
}

// ----------------------------------------------------------------------
// Value conversion for the typed primitive fan-out

/// Converts decoded physical values into their in-memory representation.
/// `SAME_REPR` marks pairs sharing one bit representation, for which the
/// physical reader can write straight into the output buffer.
pub trait Convert<In, Out>: 'static {
  const SAME_REPR: bool;
  fn convert(v: &In) -> Out;
}

/// Plain numeric casts, including same-width reinterpretations.
pub struct CastConverter;

macro_rules! cast_convert {
  ($in_ty:ty, $out_ty:ty, $same_repr:expr) => {
    impl Convert<$in_ty, $out_ty> for CastConverter {
      const SAME_REPR: bool = $same_repr;
      fn convert(v: &$in_ty) -> $out_ty {
        *v as $out_ty
      }
    }
  };
}

cast_convert!(i32, i32, true);
cast_convert!(i32, u32, true);
cast_convert!(i64, i64, true);
cast_convert!(i64, u64, true);
cast_convert!(f32, f32, true);
cast_convert!(f64, f64, true);
cast_convert!(i32, i8, false);
cast_convert!(i32, i16, false);
cast_convert!(i32, u8, false);
cast_convert!(i32, u16, false);

/// Days since the epoch widened to milliseconds since the epoch.
pub struct Date64Converter;

impl Convert<i32, i64> for Date64Converter {
  const SAME_REPR: bool = false;

  fn convert(v: &i32) -> i64 {
    *v as i64 * 86_400_000
  }
}

/// 96-bit Julian-day timestamps to nanoseconds since the epoch.
pub struct Int96NanosConverter;

impl Convert<Int96, i64> for Int96NanosConverter {
  const SAME_REPR: bool = false;

  fn convert(v: &Int96) -> i64 {
    v.to_nanos()
  }
}

// ----------------------------------------------------------------------
// Leaf reader for fixed-width primitive columns

/// Reads one leaf column into a fixed-width primitive array, converting
/// physical values of `T` into native values of `O` via `C`.
pub struct PrimitiveArrayReader<T, O, C>
where
  T: PhysicalDataType,
  O: Copy + 'static,
  C: Convert<T::T, O>
{
  pool: MemoryPoolPtr,
  input: FileColumnIterator,
  descr: ColumnDescPtr,
  data_type: DataType,
  column_reader: Option<Box<dyn TypedColumnReader<T>>>,
  values_buffer: Vec<T::T>,
  def_levels_buffer: Vec<i16>,
  rep_levels_buffer: Vec<i16>,
  _phantom: PhantomData<(O, C)>
}

impl<T, O, C> PrimitiveArrayReader<T, O, C>
where
  T: PhysicalDataType,
  O: Copy + 'static,
  C: Convert<T::T, O>
{
  pub fn new(pool: MemoryPoolPtr, mut input: FileColumnIterator, data_type: DataType) -> Result<Self> {
    let descr = input.descr();
    let column_reader = match input.next()? {
      Some(reader) => Some(get_typed_column_reader::<T>(reader)?),
      None => None
    };
    Ok(PrimitiveArrayReader {
      pool,
      input,
      descr,
      data_type,
      column_reader,
      values_buffer: vec![],
      def_levels_buffer: vec![],
      rep_levels_buffer: vec![],
      _phantom: PhantomData
    })
  }

  fn next_row_group(&mut self) -> Result<()> {
    self.column_reader = match self.input.next()? {
      Some(reader) => Some(get_typed_column_reader::<T>(reader)?),
      None => None
    };
    Ok(())
  }

  // Reinterpret an output slice as physical values; only valid for
  // `SAME_REPR` conversions.
  fn as_physical_mut(out: &mut [O]) -> &mut [T::T] {
    debug_assert!(C::SAME_REPR);
    debug_assert_eq!(mem::size_of::<O>(), mem::size_of::<T::T>());
    debug_assert_eq!(mem::align_of::<O>(), mem::align_of::<T::T>());
    unsafe { slice::from_raw_parts_mut(out.as_mut_ptr() as *mut T::T, out.len()) }
  }
}

impl<T, O, C> ArrayReader for PrimitiveArrayReader<T, O, C>
where
  T: PhysicalDataType,
  O: Copy + 'static,
  C: Convert<T::T, O>
{
  fn data_type(&self) -> &DataType {
    &self.data_type
  }

  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>> {
    if self.column_reader.is_none() {
      return Ok(None);
    }
    let max_def = self.descr.max_def_level();
    let max_rep = self.descr.max_rep_level();
    let min_space_def = self.descr.min_space_def_level();

    let mut data_buffer = ByteBuffer::allocate(
      self.pool.clone(), batch_size * mem::size_of::<O>());
    data_buffer.resize(batch_size * mem::size_of::<O>());
    let mut valid_bits = if max_def > 0 {
      let mut buffer = ByteBuffer::allocate(
        self.pool.clone(), bit_util::bytes_for_bits(batch_size));
      buffer.resize(bit_util::bytes_for_bits(batch_size));
      buffer
    } else {
      ByteBuffer::new()
    };
    self.def_levels_buffer.clear();
    self.def_levels_buffer.resize(if max_def > 0 { batch_size } else { 0 }, 0);
    self.rep_levels_buffer.clear();
    self.rep_levels_buffer.resize(if max_rep > 0 { batch_size } else { 0 }, 0);

    let mut slots = 0;
    let mut levels_total = 0;
    let mut null_count = 0;
    let mut values_to_read = batch_size;

    loop {
      if values_to_read == 0 {
        break;
      }
      let reader = match self.column_reader {
        Some(ref mut reader) => reader,
        None => break
      };
      if max_def == 0 {
        // No levels at all: values land directly in their final slots.
        let levels_read = if C::SAME_REPR {
          let out = Self::as_physical_mut(
            &mut data_buffer.typed_data_mut::<O>()[slots..slots + values_to_read]);
          reader.read_batch(values_to_read, None, None, out)?.0
        } else {
          self.values_buffer.resize(values_to_read, T::T::default());
          let (levels_read, values_read) = reader.read_batch(
            values_to_read, None, None, &mut self.values_buffer[..values_to_read])?;
          let out = data_buffer.typed_data_mut::<O>();
          for i in 0..values_read {
            out[slots + i] = C::convert(&self.values_buffer[i]);
          }
          levels_read
        };
        slots += levels_read;
        values_to_read -= levels_read;
      } else if max_rep == 0 {
        // Nullable flat column: spaced read places values and validity.
        let def_out = &mut self.def_levels_buffer[levels_total..levels_total + values_to_read];
        let (levels_read, _, nulls) = if C::SAME_REPR {
          let out = Self::as_physical_mut(
            &mut data_buffer.typed_data_mut::<O>()[slots..slots + values_to_read]);
          reader.read_batch_spaced(
            values_to_read, def_out, None, out, valid_bits.data_mut(), slots)?
        } else {
          self.values_buffer.resize(values_to_read, T::T::default());
          let result = reader.read_batch_spaced(
            values_to_read, def_out, None, &mut self.values_buffer[..values_to_read],
            valid_bits.data_mut(), slots)?;
          let out = data_buffer.typed_data_mut::<O>();
          for i in 0..result.0 {
            if bit_util::get_array_bit(valid_bits.data(), slots + i) {
              out[slots + i] = C::convert(&self.values_buffer[i]);
            }
          }
          result
        };
        slots += levels_read;
        levels_total += levels_read;
        null_count += nulls;
        values_to_read -= levels_read;
      } else {
        // Repeated context: read the dense stream, then place values by
        // the slot rule (a level entry occupies a slot iff its def level
        // reaches the min-space bound).
        self.values_buffer.resize(values_to_read, T::T::default());
        let (levels_read, values_read) = reader.read_batch(
          values_to_read,
          Some(&mut self.def_levels_buffer[levels_total..levels_total + values_to_read]),
          Some(&mut self.rep_levels_buffer[levels_total..levels_total + values_to_read]),
          &mut self.values_buffer[..values_to_read])?;
        let out = data_buffer.typed_data_mut::<O>();
        let mut value_idx = 0;
        for i in 0..levels_read {
          let def = self.def_levels_buffer[levels_total + i];
          if def == max_def {
            out[slots] = C::convert(&self.values_buffer[value_idx]);
            value_idx += 1;
            bit_util::set_array_bit(valid_bits.data_mut(), slots);
            slots += 1;
          } else if def >= min_space_def {
            null_count += 1;
            slots += 1;
          }
        }
        debug_assert_eq!(value_idx, values_read);
        levels_total += levels_read;
        values_to_read -= levels_read;
      }
      let advance = match self.column_reader {
        Some(ref reader) => !reader.has_next(),
        None => false
      };
      if advance {
        self.next_row_group()?;
      }
    }

    self.def_levels_buffer.truncate(levels_total);
    self.rep_levels_buffer.truncate(cmp::min(levels_total, self.rep_levels_buffer.len()));

    data_buffer.resize(slots * mem::size_of::<O>());
    let validity = finish_validity(
      &self.pool, valid_bits, max_def > 0, null_count, slots, batch_size);
    Ok(Some(Array::Primitive(PrimitiveArray::new(
      self.data_type.clone(), slots, data_buffer.consume(), validity, null_count))))
  }

  fn get_def_levels(&self) -> &[i16] {
    &self.def_levels_buffer
  }

  fn get_rep_levels(&self) -> &[i16] {
    &self.rep_levels_buffer
  }

  fn max_def_level(&self) -> i16 {
    self.descr.max_def_level()
  }

  fn max_rep_level(&self) -> i16 {
    self.descr.max_rep_level()
  }
}

// Shrink-and-transfer for a validity buffer: elided when the batch had no
// nulls, reallocated to fit when utilization dropped below 80%.
fn finish_validity(
  pool: &MemoryPoolPtr,
  mut valid_bits: ByteBuffer,
  nullable: bool,
  null_count: usize,
  slots: usize,
  batch_size: usize
) -> Option<crate::util::memory::BytePtr> {
  if !nullable || null_count == 0 {
    return None;
  }
  let needed = bit_util::bytes_for_bits(slots);
  if slots < batch_size * 4 / 5 {
    let mut shrunk = ByteBuffer::allocate(pool.clone(), needed);
    shrunk.resize(needed);
    shrunk.data_mut().copy_from_slice(&valid_bits.data()[..needed]);
    Some(shrunk.consume())
  } else {
    valid_bits.resize(needed);
    Some(valid_bits.consume())
  }
}

// ----------------------------------------------------------------------
// Leaf reader for boolean columns

/// Reads one boolean leaf column into a bit-packed array.
pub struct BooleanArrayReader {
  pool: MemoryPoolPtr,
  input: FileColumnIterator,
  descr: ColumnDescPtr,
  data_type: DataType,
  column_reader: Option<Box<dyn TypedColumnReader<BoolType>>>,
  values_buffer: Vec<bool>,
  def_levels_buffer: Vec<i16>,
  rep_levels_buffer: Vec<i16>
}

impl BooleanArrayReader {
  pub fn new(pool: MemoryPoolPtr, mut input: FileColumnIterator) -> Result<Self> {
    let descr = input.descr();
    let column_reader = match input.next()? {
      Some(reader) => Some(get_typed_column_reader::<BoolType>(reader)?),
      None => None
    };
    Ok(BooleanArrayReader {
      pool,
      input,
      descr,
      data_type: DataType::Boolean,
      column_reader,
      values_buffer: vec![],
      def_levels_buffer: vec![],
      rep_levels_buffer: vec![]
    })
  }

  fn next_row_group(&mut self) -> Result<()> {
    self.column_reader = match self.input.next()? {
      Some(reader) => Some(get_typed_column_reader::<BoolType>(reader)?),
      None => None
    };
    Ok(())
  }
}

impl ArrayReader for BooleanArrayReader {
  fn data_type(&self) -> &DataType {
    &self.data_type
  }

  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>> {
    if self.column_reader.is_none() {
      return Ok(None);
    }
    let max_def = self.descr.max_def_level();
    let max_rep = self.descr.max_rep_level();
    let min_space_def = self.descr.min_space_def_level();

    let mut data_buffer = ByteBuffer::allocate(
      self.pool.clone(), bit_util::bytes_for_bits(batch_size));
    data_buffer.resize(bit_util::bytes_for_bits(batch_size));
    let mut valid_bits = if max_def > 0 {
      let mut buffer = ByteBuffer::allocate(
        self.pool.clone(), bit_util::bytes_for_bits(batch_size));
      buffer.resize(bit_util::bytes_for_bits(batch_size));
      buffer
    } else {
      ByteBuffer::new()
    };
    self.def_levels_buffer.clear();
    self.def_levels_buffer.resize(if max_def > 0 { batch_size } else { 0 }, 0);
    self.rep_levels_buffer.clear();
    self.rep_levels_buffer.resize(if max_rep > 0 { batch_size } else { 0 }, 0);

    let mut slots = 0;
    let mut levels_total = 0;
    let mut null_count = 0;
    let mut values_to_read = batch_size;

    loop {
      if values_to_read == 0 {
        break;
      }
      let reader = match self.column_reader {
        Some(ref mut reader) => reader,
        None => break
      };
      self.values_buffer.resize(values_to_read, false);
      if max_def == 0 {
        let (levels_read, _) = reader.read_batch(
          values_to_read, None, None, &mut self.values_buffer[..values_to_read])?;
        for i in 0..levels_read {
          if self.values_buffer[i] {
            bit_util::set_array_bit(data_buffer.data_mut(), slots + i);
          }
        }
        slots += levels_read;
        values_to_read -= levels_read;
      } else if max_rep == 0 {
        let (levels_read, _, nulls) = reader.read_batch_spaced(
          values_to_read,
          &mut self.def_levels_buffer[levels_total..levels_total + values_to_read],
          None, &mut self.values_buffer[..values_to_read],
          valid_bits.data_mut(), slots)?;
        for i in 0..levels_read {
          if bit_util::get_array_bit(valid_bits.data(), slots + i) && self.values_buffer[i] {
            bit_util::set_array_bit(data_buffer.data_mut(), slots + i);
          }
        }
        slots += levels_read;
        levels_total += levels_read;
        null_count += nulls;
        values_to_read -= levels_read;
      } else {
        let (levels_read, values_read) = reader.read_batch(
          values_to_read,
          Some(&mut self.def_levels_buffer[levels_total..levels_total + values_to_read]),
          Some(&mut self.rep_levels_buffer[levels_total..levels_total + values_to_read]),
          &mut self.values_buffer[..values_to_read])?;
        let mut value_idx = 0;
        for i in 0..levels_read {
          let def = self.def_levels_buffer[levels_total + i];
          if def == max_def {
            if self.values_buffer[value_idx] {
              bit_util::set_array_bit(data_buffer.data_mut(), slots);
            }
            value_idx += 1;
            bit_util::set_array_bit(valid_bits.data_mut(), slots);
            slots += 1;
          } else if def >= min_space_def {
            null_count += 1;
            slots += 1;
          }
        }
        debug_assert_eq!(value_idx, values_read);
        levels_total += levels_read;
        values_to_read -= levels_read;
      }
      let advance = match self.column_reader {
        Some(ref reader) => !reader.has_next(),
        None => false
      };
      if advance {
        self.next_row_group()?;
      }
    }

    self.def_levels_buffer.truncate(levels_total);
    self.rep_levels_buffer.truncate(cmp::min(levels_total, self.rep_levels_buffer.len()));

    data_buffer.resize(bit_util::bytes_for_bits(slots));
    let validity = finish_validity(
      &self.pool, valid_bits, max_def > 0, null_count, slots, batch_size);
    Ok(Some(Array::Primitive(PrimitiveArray::new(
      DataType::Boolean, slots, data_buffer.consume(), validity, null_count))))
  }

  fn get_def_levels(&self) -> &[i16] {
    &self.def_levels_buffer
  }

  fn get_rep_levels(&self) -> &[i16] {
    &self.rep_levels_buffer
  }

  fn max_def_level(&self) -> i16 {
    self.descr.max_def_level()
  }

  fn max_rep_level(&self) -> i16 {
    self.descr.max_rep_level()
  }
}

// ----------------------------------------------------------------------
// Leaf readers for byte array columns

/// Reads one variable-length binary leaf column, building the offsets and
/// value buffers as it goes.
pub struct ByteArrayReader {
  pool: MemoryPoolPtr,
  input: FileColumnIterator,
  descr: ColumnDescPtr,
  data_type: DataType,
  column_reader: Option<Box<dyn TypedColumnReader<ByteArrayType>>>,
  values_buffer: Vec<ByteArray>,
  def_levels_buffer: Vec<i16>,
  rep_levels_buffer: Vec<i16>
}

impl ByteArrayReader {
  pub fn new(pool: MemoryPoolPtr, mut input: FileColumnIterator, data_type: DataType) -> Result<Self> {
    assert!(matches!(data_type, DataType::Utf8 | DataType::Binary));
    let descr = input.descr();
    let column_reader = match input.next()? {
      Some(reader) => Some(get_typed_column_reader::<ByteArrayType>(reader)?),
      None => None
    };
    Ok(ByteArrayReader {
      pool,
      input,
      descr,
      data_type,
      column_reader,
      values_buffer: vec![],
      def_levels_buffer: vec![],
      rep_levels_buffer: vec![]
    })
  }

  fn next_row_group(&mut self) -> Result<()> {
    self.column_reader = match self.input.next()? {
      Some(reader) => Some(get_typed_column_reader::<ByteArrayType>(reader)?),
      None => None
    };
    Ok(())
  }
}

impl ArrayReader for ByteArrayReader {
  fn data_type(&self) -> &DataType {
    &self.data_type
  }

  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>> {
    if self.column_reader.is_none() {
      return Ok(None);
    }
    let max_def = self.descr.max_def_level();
    let max_rep = self.descr.max_rep_level();
    let min_space_def = self.descr.min_space_def_level();

    let mut offsets: Vec<i32> = vec![0];
    let mut value_data = ByteBuffer::allocate(self.pool.clone(), 0);
    let mut valid_bits = if max_def > 0 {
      let mut buffer = ByteBuffer::allocate(
        self.pool.clone(), bit_util::bytes_for_bits(batch_size));
      buffer.resize(bit_util::bytes_for_bits(batch_size));
      buffer
    } else {
      ByteBuffer::new()
    };
    self.def_levels_buffer.clear();
    self.def_levels_buffer.resize(if max_def > 0 { batch_size } else { 0 }, 0);
    self.rep_levels_buffer.clear();
    self.rep_levels_buffer.resize(if max_rep > 0 { batch_size } else { 0 }, 0);

    let mut slots = 0;
    let mut levels_total = 0;
    let mut null_count = 0;
    let mut values_to_read = batch_size;

    loop {
      if values_to_read == 0 {
        break;
      }
      let reader = match self.column_reader {
        Some(ref mut reader) => reader,
        None => break
      };
      self.values_buffer.resize(values_to_read, ByteArray::new());
      let (levels_read, values_read) = reader.read_batch(
        values_to_read,
        if max_def > 0 {
          Some(&mut self.def_levels_buffer[levels_total..levels_total + values_to_read])
        } else {
          None
        },
        if max_rep > 0 {
          Some(&mut self.rep_levels_buffer[levels_total..levels_total + values_to_read])
        } else {
          None
        },
        &mut self.values_buffer[..values_to_read])?;
      let mut value_idx = 0;
      for i in 0..levels_read {
        let def = if max_def > 0 {
          self.def_levels_buffer[levels_total + i]
        } else {
          0
        };
        if max_def == 0 || def == max_def {
          let value = &self.values_buffer[value_idx];
          value_idx += 1;
          value_data.write_all(value.data())?;
          offsets.push(value_data.size() as i32);
          if max_def > 0 {
            bit_util::set_array_bit(valid_bits.data_mut(), slots);
          }
          slots += 1;
        } else if def >= min_space_def {
          offsets.push(value_data.size() as i32);
          null_count += 1;
          slots += 1;
        }
      }
      debug_assert_eq!(value_idx, values_read);
      levels_total += if max_def > 0 { levels_read } else { 0 };
      values_to_read -= levels_read;
      let advance = match self.column_reader {
        Some(ref reader) => !reader.has_next(),
        None => false
      };
      if advance {
        self.next_row_group()?;
      }
    }

    self.def_levels_buffer.truncate(levels_total);
    self.rep_levels_buffer.truncate(cmp::min(levels_total, self.rep_levels_buffer.len()));

    debug_assert_eq!(offsets.len(), slots + 1);
    let mut offsets_buffer = ByteBuffer::allocate(
      self.pool.clone(), offsets.len() * mem::size_of::<i32>());
    offsets_buffer.resize(offsets.len() * mem::size_of::<i32>());
    offsets_buffer.typed_data_mut::<i32>().copy_from_slice(&offsets);
    let validity = finish_validity(
      &self.pool, valid_bits, max_def > 0, null_count, slots, batch_size);
    Ok(Some(Array::Binary(BinaryArray::new(
      self.data_type.clone(), slots, Some(offsets_buffer.consume()),
      value_data.consume(), validity, null_count))))
  }

  fn get_def_levels(&self) -> &[i16] {
    &self.def_levels_buffer
  }

  fn get_rep_levels(&self) -> &[i16] {
    &self.rep_levels_buffer
  }

  fn max_def_level(&self) -> i16 {
    self.descr.max_def_level()
  }

  fn max_rep_level(&self) -> i16 {
    self.descr.max_rep_level()
  }
}

/// Reads one fixed-width binary leaf column.
pub struct FixedLenByteArrayReader {
  pool: MemoryPoolPtr,
  input: FileColumnIterator,
  descr: ColumnDescPtr,
  data_type: DataType,
  byte_width: usize,
  column_reader: Option<Box<dyn TypedColumnReader<FixedLenByteArrayType>>>,
  values_buffer: Vec<ByteArray>,
  def_levels_buffer: Vec<i16>,
  rep_levels_buffer: Vec<i16>
}

impl FixedLenByteArrayReader {
  pub fn new(pool: MemoryPoolPtr, mut input: FileColumnIterator, data_type: DataType) -> Result<Self> {
    let byte_width = match data_type {
      DataType::FixedSizeBinary(width) => width as usize,
      ref other => panic!("FixedLenByteArrayReader does not support {}", other)
    };
    let descr = input.descr();
    debug_assert_eq!(descr.type_length() as usize, byte_width);
    let column_reader = match input.next()? {
      Some(reader) => Some(get_typed_column_reader::<FixedLenByteArrayType>(reader)?),
      None => None
    };
    Ok(FixedLenByteArrayReader {
      pool,
      input,
      descr,
      data_type,
      byte_width,
      column_reader,
      values_buffer: vec![],
      def_levels_buffer: vec![],
      rep_levels_buffer: vec![]
    })
  }

  fn next_row_group(&mut self) -> Result<()> {
    self.column_reader = match self.input.next()? {
      Some(reader) => Some(get_typed_column_reader::<FixedLenByteArrayType>(reader)?),
      None => None
    };
    Ok(())
  }
}

impl ArrayReader for FixedLenByteArrayReader {
  fn data_type(&self) -> &DataType {
    &self.data_type
  }

  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>> {
    if self.column_reader.is_none() {
      return Ok(None);
    }
    let max_def = self.descr.max_def_level();
    let max_rep = self.descr.max_rep_level();
    let min_space_def = self.descr.min_space_def_level();
    let byte_width = self.byte_width;

    let mut data_buffer = ByteBuffer::allocate(self.pool.clone(), batch_size * byte_width);
    data_buffer.resize(batch_size * byte_width);
    let mut valid_bits = if max_def > 0 {
      let mut buffer = ByteBuffer::allocate(
        self.pool.clone(), bit_util::bytes_for_bits(batch_size));
      buffer.resize(bit_util::bytes_for_bits(batch_size));
      buffer
    } else {
      ByteBuffer::new()
    };
    self.def_levels_buffer.clear();
    self.def_levels_buffer.resize(if max_def > 0 { batch_size } else { 0 }, 0);
    self.rep_levels_buffer.clear();
    self.rep_levels_buffer.resize(if max_rep > 0 { batch_size } else { 0 }, 0);

    let mut slots = 0;
    let mut levels_total = 0;
    let mut null_count = 0;
    let mut values_to_read = batch_size;

    loop {
      if values_to_read == 0 {
        break;
      }
      let reader = match self.column_reader {
        Some(ref mut reader) => reader,
        None => break
      };
      self.values_buffer.resize(values_to_read, ByteArray::new());
      let (levels_read, values_read) = reader.read_batch(
        values_to_read,
        if max_def > 0 {
          Some(&mut self.def_levels_buffer[levels_total..levels_total + values_to_read])
        } else {
          None
        },
        if max_rep > 0 {
          Some(&mut self.rep_levels_buffer[levels_total..levels_total + values_to_read])
        } else {
          None
        },
        &mut self.values_buffer[..values_to_read])?;
      let mut value_idx = 0;
      for i in 0..levels_read {
        let def = if max_def > 0 {
          self.def_levels_buffer[levels_total + i]
        } else {
          0
        };
        if max_def == 0 || def == max_def {
          let value = &self.values_buffer[value_idx];
          value_idx += 1;
          if value.len() != byte_width {
            return Err(invalid_err!(
              "Fixed length byte array value has {} bytes but the column width is {}",
              value.len(), byte_width));
          }
          data_buffer.data_mut()[slots * byte_width..(slots + 1) * byte_width]
            .copy_from_slice(value.data());
          if max_def > 0 {
            bit_util::set_array_bit(valid_bits.data_mut(), slots);
          }
          slots += 1;
        } else if def >= min_space_def {
          null_count += 1;
          slots += 1;
        }
      }
      debug_assert_eq!(value_idx, values_read);
      levels_total += if max_def > 0 { levels_read } else { 0 };
      values_to_read -= levels_read;
      let advance = match self.column_reader {
        Some(ref reader) => !reader.has_next(),
        None => false
      };
      if advance {
        self.next_row_group()?;
      }
    }

    self.def_levels_buffer.truncate(levels_total);
    self.rep_levels_buffer.truncate(cmp::min(levels_total, self.rep_levels_buffer.len()));

    data_buffer.resize(slots * byte_width);
    let validity = finish_validity(
      &self.pool, valid_bits, max_def > 0, null_count, slots, batch_size);
    Ok(Some(Array::Binary(BinaryArray::new(
      self.data_type.clone(), slots, None, data_buffer.consume(), validity, null_count))))
  }

  fn get_def_levels(&self) -> &[i16] {
    &self.def_levels_buffer
  }

  fn get_rep_levels(&self) -> &[i16] {
    &self.rep_levels_buffer
  }

  fn max_def_level(&self) -> i16 {
    self.descr.max_def_level()
  }

  fn max_rep_level(&self) -> i16 {
    self.descr.max_rep_level()
  }
}

// ----------------------------------------------------------------------
// List reader

/// Wraps a child reader in one level of repetition, synthesizing offsets
/// from the child's repetition levels and validity from its definition
/// levels.
pub struct ListArrayReader {
  pool: MemoryPoolPtr,
  child: Box<dyn ArrayReader>,
  data_type: DataType,
  list_def_level: i16,
  list_rep_level: i16,
  min_space_def_level: i16,
  def_levels_buffer: Vec<i16>,
  rep_levels_buffer: Vec<i16>
}

impl ListArrayReader {
  pub fn new(
    pool: MemoryPoolPtr,
    child: Box<dyn ArrayReader>,
    data_type: DataType,
    list_def_level: i16,
    list_rep_level: i16,
    min_space_def_level: i16
  ) -> Self {
    assert!(matches!(data_type, DataType::List(_)));
    ListArrayReader {
      pool,
      child,
      data_type,
      list_def_level,
      list_rep_level,
      min_space_def_level,
      def_levels_buffer: vec![],
      rep_levels_buffer: vec![]
    }
  }

  // Folds each run of child level entries belonging to one list slot into
  // one derived (def, rep) pair. A new slot starts wherever the child's
  // repetition level drops below the child's max repetition level.
  fn derive_levels(&mut self) -> Result<()> {
    let child_def = self.child.get_def_levels();
    let child_rep = self.child.get_rep_levels();
    if child_def.len() != child_rep.len() {
      return Err(invalid_err!(
        "Definition and repetition level streams have different lengths: {} != {}",
        child_def.len(), child_rep.len()));
    }
    let child_max_rep = self.child.max_rep_level();
    let mut i = 0;
    while i < child_def.len() {
      let mut def = child_def[i];
      let mut rep = cmp::min(self.list_rep_level, child_rep[i]);
      i += 1;
      while i < child_def.len() && child_rep[i] >= child_max_rep {
        def = cmp::max(def, child_def[i]);
        rep = cmp::min(rep, child_rep[i]);
        i += 1;
      }
      self.def_levels_buffer.push(cmp::min(def, self.list_def_level));
      self.rep_levels_buffer.push(rep);
    }
    Ok(())
  }
}

impl ArrayReader for ListArrayReader {
  fn data_type(&self) -> &DataType {
    &self.data_type
  }

  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>> {
    self.def_levels_buffer.clear();
    self.rep_levels_buffer.clear();

    let child_array = match self.child.next_batch(batch_size)? {
      Some(array) => array,
      None => return Ok(None)
    };
    self.derive_levels()?;

    // Offsets: walk the child stream forward over each defined, non-empty
    // list, counting the slots it contributes to the child array.
    let child_def = self.child.get_def_levels();
    let child_rep = self.child.get_rep_levels();
    let mut offsets: Vec<i32> = vec![0];
    let mut child_level_idx = 0;
    let mut child_val_idx: i32 = 0;
    for &def in &self.def_levels_buffer {
      if def == self.list_def_level
        && child_level_idx < child_def.len()
        && child_def[child_level_idx] > self.list_def_level
      {
        loop {
          child_level_idx += 1;
          child_val_idx += 1;
          if child_level_idx >= child_rep.len()
            || child_rep[child_level_idx] <= self.list_rep_level
          {
            break;
          }
        }
      } else {
        child_level_idx += 1;
      }
      if def >= self.min_space_def_level {
        offsets.push(child_val_idx);
      }
    }
    if child_val_idx as usize != child_array.len() {
      return Err(invalid_err!(
        "List offsets cover {} child slots but the child array has length {}",
        child_val_idx, child_array.len()));
    }
    let length = offsets.len() - 1;

    // Validity: a slot is present when its def level reaches the list
    // level, null when it only reaches the min-space bound, and absent
    // otherwise.
    let mut valid_bits = ByteBuffer::allocate(
      self.pool.clone(), bit_util::bytes_for_bits(cmp::max(self.def_levels_buffer.len(), 1)));
    valid_bits.resize(bit_util::bytes_for_bits(cmp::max(self.def_levels_buffer.len(), 1)));
    let mut slot = 0;
    let mut null_count = 0;
    for &def in &self.def_levels_buffer {
      if def >= self.list_def_level {
        bit_util::set_array_bit(valid_bits.data_mut(), slot);
        slot += 1;
      } else if def >= self.min_space_def_level {
        null_count += 1;
        slot += 1;
      }
    }
    debug_assert_eq!(slot, length);
    let validity = if null_count > 0 {
      valid_bits.resize(bit_util::bytes_for_bits(length));
      Some(valid_bits.consume())
    } else {
      None
    };

    let mut offsets_buffer = ByteBuffer::allocate(
      self.pool.clone(), offsets.len() * mem::size_of::<i32>());
    offsets_buffer.resize(offsets.len() * mem::size_of::<i32>());
    offsets_buffer.typed_data_mut::<i32>().copy_from_slice(&offsets);

    Ok(Some(Array::List(ListArray::new(
      self.data_type.clone(), length, offsets_buffer.consume(),
      Box::new(child_array), validity, null_count))))
  }

  fn get_def_levels(&self) -> &[i16] {
    &self.def_levels_buffer
  }

  fn get_rep_levels(&self) -> &[i16] {
    &self.rep_levels_buffer
  }

  fn max_def_level(&self) -> i16 {
    self.list_def_level
  }

  fn max_rep_level(&self) -> i16 {
    self.list_rep_level
  }
}

// ----------------------------------------------------------------------
// Struct reader

/// Composes sibling child readers into one struct array, synthesizing
/// struct-level validity from the merged definition levels.
pub struct StructArrayReader {
  pool: MemoryPoolPtr,
  children: Vec<Box<dyn ArrayReader>>,
  data_type: DataType,
  struct_def_level: i16,
  struct_rep_level: i16,
  min_space_def_level: i16,
  def_levels_buffer: Vec<i16>,
  rep_levels_buffer: Vec<i16>
}

impl StructArrayReader {
  pub fn new(
    pool: MemoryPoolPtr,
    children: Vec<Box<dyn ArrayReader>>,
    data_type: DataType,
    struct_def_level: i16,
    struct_rep_level: i16,
    min_space_def_level: i16
  ) -> Self {
    assert!(matches!(data_type, DataType::Struct(_)));
    assert!(!children.is_empty());
    StructArrayReader {
      pool,
      children,
      data_type,
      struct_def_level,
      struct_rep_level,
      min_space_def_level,
      def_levels_buffer: vec![],
      rep_levels_buffer: vec![]
    }
  }

  // When the struct is present all children report at least the struct's
  // def level; when it is absent they all report the same lower level, and
  // max-of-min recovers it. The -1 seed marks unvisited positions.
  fn merge_def_levels(&mut self) -> Result<()> {
    let mut merged: Vec<i16> = vec![];
    for child in &self.children {
      let child_def = child.get_def_levels();
      if child_def.is_empty() {
        continue;
      }
      if merged.is_empty() {
        merged = vec![-1; child_def.len()];
      }
      if child_def.len() != merged.len() {
        return Err(invalid_err!(
          "Struct children expose definition level streams of different lengths: {} != {}",
          child_def.len(), merged.len()));
      }
      for i in 0..child_def.len() {
        merged[i] = cmp::max(merged[i], cmp::min(child_def[i], self.struct_def_level));
      }
    }
    self.def_levels_buffer = merged;
    Ok(())
  }

  fn merge_rep_levels(&mut self) -> Result<()> {
    let mut merged: Vec<i16> = vec![];
    for child in &self.children {
      let child_rep = child.get_rep_levels();
      if child_rep.is_empty() {
        continue;
      }
      if merged.is_empty() {
        merged = vec![child.max_rep_level(); child_rep.len()];
      }
      if child_rep.len() != merged.len() {
        return Err(invalid_err!(
          "Struct children expose repetition level streams of different lengths: {} != {}",
          child_rep.len(), merged.len()));
      }
      for i in 0..child_rep.len() {
        merged[i] = cmp::min(merged[i], child_rep[i]);
      }
    }
    self.rep_levels_buffer = merged;
    Ok(())
  }
}

impl ArrayReader for StructArrayReader {
  fn data_type(&self) -> &DataType {
    &self.data_type
  }

  fn next_batch(&mut self, batch_size: usize) -> Result<Option<Array>> {
    self.def_levels_buffer.clear();
    self.rep_levels_buffer.clear();

    let mut child_arrays = Vec::with_capacity(self.children.len());
    for child in &mut self.children {
      match child.next_batch(batch_size)? {
        Some(array) => child_arrays.push(array),
        None => return Ok(None)
      }
    }
    let length = child_arrays[0].len();
    for array in &child_arrays[1..] {
      if array.len() != length {
        return Err(invalid_err!(
          "Struct children have different lengths: {} != {}", array.len(), length));
      }
    }

    self.merge_def_levels()?;
    self.merge_rep_levels()?;

    let mut null_count = 0;
    let validity = if !self.def_levels_buffer.is_empty() {
      let bitmap_bytes = bit_util::bytes_for_bits(cmp::max(self.def_levels_buffer.len(), 1));
      let mut valid_bits = ByteBuffer::allocate(self.pool.clone(), bitmap_bytes);
      valid_bits.resize(bitmap_bytes);
      let mut slot = 0;
      for &def in &self.def_levels_buffer {
        if def >= self.struct_def_level {
          bit_util::set_array_bit(valid_bits.data_mut(), slot);
          slot += 1;
        } else if def >= self.min_space_def_level {
          null_count += 1;
          slot += 1;
        }
      }
      if slot != length {
        return Err(invalid_err!(
          "Struct validity has {} entries but the children have length {}", slot, length));
      }
      if null_count > 0 {
        valid_bits.resize(bit_util::bytes_for_bits(length));
        Some(valid_bits.consume())
      } else {
        None
      }
    } else {
      None
    };

    Ok(Some(Array::Struct(StructArray::new(
      self.data_type.clone(), length, child_arrays, validity, null_count))))
  }

  fn get_def_levels(&self) -> &[i16] {
    &self.def_levels_buffer
  }

  fn get_rep_levels(&self) -> &[i16] {
    &self.rep_levels_buffer
  }

  fn max_def_level(&self) -> i16 {
    self.struct_def_level
  }

  fn max_rep_level(&self) -> i16 {
    self.struct_rep_level
  }
}

// ----------------------------------------------------------------------
// Assembler tree construction

struct BuilderContext {
  pool: MemoryPoolPtr,
  file_reader: Arc<dyn FileReader>,
  leaf_indices: HashMap<*const Type, usize>,
  selected: HashSet<usize>,
  row_group: Option<usize>
}

/// Build the assembler tree for the schema subtree rooted at `node`,
/// restricted to the leaf columns in `column_indices`. Returns `None`
/// when none of the subtree's leaves are selected.
pub fn build_array_reader(
  pool: MemoryPoolPtr,
  file_reader: Arc<dyn FileReader>,
  node: &TypePtr,
  column_indices: &[usize],
  row_group: Option<usize>
) -> Result<Option<Box<dyn ArrayReader>>> {
  let descr = file_reader.metadata().file_metadata().schema_descr().clone();
  let mut leaf_indices = HashMap::new();
  for i in 0..descr.num_columns() {
    leaf_indices.insert(Arc::as_ptr(&descr.column(i).self_type_ptr()), i);
  }
  let context = BuilderContext {
    pool,
    file_reader,
    leaf_indices,
    selected: column_indices.iter().cloned().collect(),
    row_group
  };
  Ok(build_for_node(&context, node, 0, 0, 0)?.map(|(reader, _)| reader))
}

fn build_for_node(
  context: &BuilderContext,
  node: &TypePtr,
  parent_def_level: i16,
  parent_rep_level: i16,
  min_space_def_level: i16
) -> Result<Option<(Box<dyn ArrayReader>, Field)>> {
  let def_level = match node.get_basic_info().repetition() {
    Repetition::REQUIRED => parent_def_level,
    _ => parent_def_level + 1
  };

  match node.as_ref() {
    Type::PrimitiveType { .. } => {
      let column_index = match context.leaf_indices.get(&Arc::as_ptr(node)) {
        Some(&index) => index,
        None => {
          return Err(invalid_err!(
            "Primitive node {} is not a leaf of the file schema", node.name()));
        }
      };
      if !context.selected.contains(&column_index) {
        return Ok(None);
      }
      let descr = context.file_reader.metadata().file_metadata().schema_descr()
        .column(column_index);
      let field = parquet_to_arrow_field(&descr)?;
      let input = FileColumnIterator::new(
        column_index, context.file_reader.clone(), context.row_group);
      let reader = build_primitive_reader(
        context.pool.clone(), input, field.data_type().clone())?;
      Ok(Some((reader, field)))
    },
    Type::GroupType { basic_info, fields } => match basic_info.logical_type() {
      LogicalType::LIST => {
        let repeated_group = list_repeated_group(node)?;
        let element = &repeated_group.get_fields()[0];
        // The repeated middle group adds one def and one rep level, and
        // bounds the element's min-space level.
        match build_for_node(
          context, element, def_level + 1, parent_rep_level + 1, def_level + 1)?
        {
          Some((child, child_field)) => {
            let data_type = DataType::List(Box::new(child_field));
            let field = Field::new(
              node.name(), data_type.clone(),
              basic_info.repetition() == Repetition::OPTIONAL);
            let reader = ListArrayReader::new(
              context.pool.clone(), child, data_type, def_level, parent_rep_level,
              min_space_def_level);
            Ok(Some((Box::new(reader), field)))
          },
          None => Ok(None)
        }
      },
      LogicalType::MAP | LogicalType::MAP_KEY_VALUE => {
        let repeated_group = map_repeated_group(node)?;
        let entry_def_level = def_level + 1;
        let entry_rep_level = parent_rep_level + 1;
        let mut child_readers = vec![];
        let mut child_fields = vec![];
        for child in repeated_group.get_fields() {
          if let Some((reader, field)) = build_for_node(
            context, child, entry_def_level, entry_rep_level, entry_def_level)?
          {
            child_readers.push(reader);
            child_fields.push(field);
          }
        }
        if child_readers.is_empty() {
          return Ok(None);
        }
        let entry_type = DataType::Struct(child_fields);
        let entry_field = Field::new(repeated_group.name(), entry_type.clone(), false);
        let entries = StructArrayReader::new(
          context.pool.clone(), child_readers, entry_type, entry_def_level,
          entry_rep_level, entry_def_level);
        let data_type = DataType::List(Box::new(entry_field));
        let field = Field::new(
          node.name(), data_type.clone(),
          basic_info.repetition() == Repetition::OPTIONAL);
        let reader = ListArrayReader::new(
          context.pool.clone(), Box::new(entries), data_type, def_level,
          parent_rep_level, min_space_def_level);
        Ok(Some((Box::new(reader), field)))
      },
      LogicalType::NONE => {
        if basic_info.repetition() == Repetition::REPEATED {
          return Err(nyi_err!(
            "Group {} is repeated but not annotated as LIST or MAP", node.name()));
        }
        let mut child_readers = vec![];
        let mut child_fields = vec![];
        for child in fields {
          if let Some((reader, field)) = build_for_node(
            context, child, def_level, parent_rep_level, min_space_def_level)?
          {
            child_readers.push(reader);
            child_fields.push(field);
          }
        }
        if child_readers.is_empty() {
          return Ok(None);
        }
        let data_type = DataType::Struct(child_fields);
        let field = Field::new(
          node.name(), data_type.clone(),
          basic_info.repetition() == Repetition::OPTIONAL);
        let reader = StructArrayReader::new(
          context.pool.clone(), child_readers, data_type, def_level, parent_rep_level,
          min_space_def_level);
        Ok(Some((Box::new(reader), field)))
      },
      other => Err(nyi_err!(
        "Group {} has unsupported logical type {}", node.name(), other))
    }
  }
}

/// Build the leaf reader for one column, dispatching on the target type
/// and the column's physical type.
pub fn build_primitive_reader(
  pool: MemoryPoolPtr,
  input: FileColumnIterator,
  data_type: DataType
) -> Result<Box<dyn ArrayReader>> {
  let physical_type = input.descr().physical_type();
  let reader: Box<dyn ArrayReader> = match (data_type.clone(), physical_type) {
    (DataType::Boolean, PhysicalType::BOOLEAN) =>
      Box::new(BooleanArrayReader::new(pool, input)?),
    (DataType::Int8, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, i8, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Int16, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, i16, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Int32, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, i32, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::UInt8, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, u8, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::UInt16, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, u16, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::UInt32, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, u32, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Int64, PhysicalType::INT64) =>
      Box::new(PrimitiveArrayReader::<Int64Type, i64, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::UInt64, PhysicalType::INT64) =>
      Box::new(PrimitiveArrayReader::<Int64Type, u64, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Float32, PhysicalType::FLOAT) =>
      Box::new(PrimitiveArrayReader::<FloatType, f32, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Float64, PhysicalType::DOUBLE) =>
      Box::new(PrimitiveArrayReader::<DoubleType, f64, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Date32, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, i32, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Date64, PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, i64, Date64Converter>::new(
        pool, input, data_type)?),
    (DataType::Time32(TimeUnit::Millisecond), PhysicalType::INT32) =>
      Box::new(PrimitiveArrayReader::<Int32Type, i32, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Time64(TimeUnit::Microsecond), PhysicalType::INT64) =>
      Box::new(PrimitiveArrayReader::<Int64Type, i64, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Timestamp(TimeUnit::Millisecond), PhysicalType::INT64) =>
      Box::new(PrimitiveArrayReader::<Int64Type, i64, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Timestamp(TimeUnit::Microsecond), PhysicalType::INT64) =>
      Box::new(PrimitiveArrayReader::<Int64Type, i64, CastConverter>::new(
        pool, input, data_type)?),
    (DataType::Timestamp(TimeUnit::Nanosecond), PhysicalType::INT96) =>
      Box::new(PrimitiveArrayReader::<Int96Type, i64, Int96NanosConverter>::new(
        pool, input, data_type)?),
    (DataType::Utf8, PhysicalType::BYTE_ARRAY) | (DataType::Binary, PhysicalType::BYTE_ARRAY) =>
      Box::new(ByteArrayReader::new(pool, input, data_type)?),
    (DataType::FixedSizeBinary(_), PhysicalType::FIXED_LEN_BYTE_ARRAY) =>
      Box::new(FixedLenByteArrayReader::new(pool, input, data_type)?),
    (data_type, physical_type) => {
      return Err(nyi_err!(
        "Reading {} arrays from {} columns is not supported", data_type, physical_type));
    }
  };
  Ok(reader)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::errors::ParquetError;
  use crate::schema::types::Type as SchemaType;
  use crate::util::memory::DefaultMemoryPool;
  use crate::util::test_common::*;

  fn pool() -> MemoryPoolPtr {
    Arc::new(DefaultMemoryPool::new())
  }

  fn primitive(
    name: &str,
    repetition: Repetition,
    physical_type: PhysicalType,
    logical_type: LogicalType
  ) -> TypePtr {
    Arc::new(SchemaType::new_primitive_type(
      name, repetition, physical_type, logical_type, 0, 0, 0).unwrap())
  }

  fn fixed_primitive(name: &str, repetition: Repetition, length: i32) -> TypePtr {
    Arc::new(SchemaType::new_primitive_type(
      name, repetition, PhysicalType::FIXED_LEN_BYTE_ARRAY, LogicalType::NONE,
      length, 0, 0).unwrap())
  }

  fn group(
    name: &str,
    repetition: Option<Repetition>,
    logical_type: LogicalType,
    fields: Vec<TypePtr>
  ) -> TypePtr {
    Arc::new(SchemaType::new_group_type(name, repetition, logical_type, fields).unwrap())
  }

  fn reader_for_field(
    file: Arc<InMemoryFileReader>,
    field_index: usize
  ) -> Box<dyn ArrayReader> {
    let descr = file.metadata().file_metadata().schema_descr().clone();
    let indices: Vec<usize> = (0..descr.num_columns()).collect();
    let node = descr.root_schema_ptr().get_fields()[field_index].clone();
    build_array_reader(pool(), file, &node, &indices, None).unwrap().unwrap()
  }

  fn validity(array: &Array) -> Vec<bool> {
    (0..array.len()).map(|i| array.is_valid(i)).collect()
  }

  #[test]
  fn test_required_int64_across_row_groups() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT64, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int64(vec![1, 2, 3]))])
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int64(vec![4, 5, 6]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    assert_eq!(*reader.data_type(), DataType::Int64);

    // A larger batch is truncated to what the chunks actually hold.
    let array = reader.next_batch(10).unwrap().unwrap();
    assert_eq!(array.len(), 6);
    assert_eq!(array.null_count(), 0);
    assert!(array.validity().is_none());
    assert_eq!(array.as_primitive().typed_values::<i64>(), &[1, 2, 3, 4, 5, 6]);
    assert!(reader.get_def_levels().is_empty());
    assert!(reader.get_rep_levels().is_empty());

    // All chunks consumed.
    assert!(reader.next_batch(1).unwrap().is_none());
  }

  #[test]
  fn test_optional_double_spaced() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("b", Repetition::OPTIONAL, PhysicalType::DOUBLE, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![0, 1, 0, 1, 1], vec![], ColumnValues::Double(vec![2.0, 4.0, 5.0]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(5).unwrap().unwrap();
    assert_eq!(array.len(), 5);
    assert_eq!(array.null_count(), 2);
    assert_eq!(validity(&array), vec![false, true, false, true, true]);
    let values = array.as_primitive().typed_values::<f64>();
    assert_eq!(values[1], 2.0);
    assert_eq!(values[3], 4.0);
    assert_eq!(values[4], 5.0);
    assert_eq!(reader.get_def_levels(), &[0, 1, 0, 1, 1]);
  }

  #[test]
  fn test_optional_boolean() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("flag", Repetition::OPTIONAL, PhysicalType::BOOLEAN, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![1, 0, 1], vec![], ColumnValues::Bool(vec![true, false]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.null_count(), 1);
    assert_eq!(validity(&array), vec![true, false, true]);
    assert!(array.as_primitive().bool_value(0));
    assert!(!array.as_primitive().bool_value(2));
  }

  #[test]
  fn test_int96_timestamp_nanos() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("ts", Repetition::REQUIRED, PhysicalType::INT96, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::required(
        ColumnValues::Int96(vec![Int96::from([1, 0, 2_440_589])]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    assert_eq!(*reader.data_type(), DataType::Timestamp(TimeUnit::Nanosecond));
    let array = reader.next_batch(1).unwrap().unwrap();
    assert_eq!(array.as_primitive().typed_values::<i64>(), &[86_400_000_000_001]);
  }

  #[test]
  fn test_date64_widening() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("d", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::DATE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int32(vec![0, 1, -1]))])
      .build();

    let input = FileColumnIterator::new(0, file, None);
    let mut reader = PrimitiveArrayReader::<Int32Type, i64, Date64Converter>::new(
      pool(), input, DataType::Date64).unwrap();
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(*array.data_type(), DataType::Date64);
    assert_eq!(
      array.as_primitive().typed_values::<i64>(),
      &[0, 86_400_000, -86_400_000]);
  }

  #[test]
  fn test_int8_narrowing() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("v", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::INT_8)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![1, 1, 0], vec![], ColumnValues::Int32(vec![127, -1]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    assert_eq!(*reader.data_type(), DataType::Int8);
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(validity(&array), vec![true, true, false]);
    let values = array.as_primitive().typed_values::<i8>();
    assert_eq!(values[0], 127);
    assert_eq!(values[1], -1);
  }

  #[test]
  fn test_utf8_with_nulls_across_row_groups() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("s", Repetition::OPTIONAL, PhysicalType::BYTE_ARRAY, LogicalType::UTF8)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![1, 0], vec![], ColumnValues::ByteArray(vec![ByteArray::from("foo")]))])
      .row_group(vec![ColumnChunkData::new(
        vec![1], vec![], ColumnValues::ByteArray(vec![ByteArray::from("barbaz")]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.null_count(), 1);
    assert_eq!(validity(&array), vec![true, false, true]);
    let binary = array.as_binary();
    assert_eq!(binary.value_offsets(), &[0, 3, 3, 9]);
    assert_eq!(binary.str_value(0), "foo");
    assert_eq!(binary.str_value(2), "barbaz");
  }

  #[test]
  fn test_fixed_len_byte_array() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      fixed_primitive("f", Repetition::OPTIONAL, 2)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![1, 0, 1], vec![],
        ColumnValues::FixedLenByteArray(vec![
          ByteArray::from(vec![1, 2]),
          ByteArray::from(vec![3, 4])
        ]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    assert_eq!(*reader.data_type(), DataType::FixedSizeBinary(2));
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(validity(&array), vec![true, false, true]);
    assert_eq!(array.as_binary().value(0), &[1, 2]);
    assert_eq!(array.as_binary().value(2), &[3, 4]);
  }

  fn optional_int_list_schema() -> TypePtr {
    group("schema", None, LogicalType::NONE, vec![
      group("xs", Some(Repetition::OPTIONAL), LogicalType::LIST, vec![
        group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          primitive("element", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
        ])
      ])
    ])
  }

  #[test]
  fn test_optional_list_of_optional_ints() {
    // Records: null, [], [1, null, 3], [4]
    let file = TestFileBuilder::new(optional_int_list_schema())
      .row_group(vec![ColumnChunkData::new(
        vec![0, 1, 3, 2, 3, 3],
        vec![0, 0, 0, 1, 1, 0],
        ColumnValues::Int32(vec![1, 3, 4]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(6).unwrap().unwrap();
    assert_eq!(array.len(), 4);
    assert_eq!(array.null_count(), 1);
    assert_eq!(validity(&array), vec![false, true, true, true]);

    let list = array.as_list();
    assert_eq!(list.value_offsets(), &[0, 0, 0, 3, 4]);
    let child = list.values();
    assert_eq!(child.len(), 4);
    assert_eq!(child.null_count(), 1);
    assert_eq!(validity(child), vec![true, false, true, true]);
    let values = child.as_primitive().typed_values::<i32>();
    assert_eq!(values[0], 1);
    assert_eq!(values[2], 3);
    assert_eq!(values[3], 4);

    // Derived level streams exposed to a would-be parent.
    assert_eq!(reader.get_def_levels(), &[0, 1, 1, 1]);
    assert_eq!(reader.get_rep_levels(), &[0, 0, 0, 0]);
  }

  #[test]
  fn test_list_of_lists() {
    // Records: [[1, 2], null, []], null
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("xs", Some(Repetition::OPTIONAL), LogicalType::LIST, vec![
        group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          group("inner", Some(Repetition::OPTIONAL), LogicalType::LIST, vec![
            group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
              primitive("element", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
            ])
          ])
        ])
      ])
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![5, 5, 2, 3, 0],
        vec![0, 2, 1, 1, 0],
        ColumnValues::Int32(vec![1, 2]))])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(5).unwrap().unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array.null_count(), 1);
    assert_eq!(validity(&array), vec![true, false]);
    assert_eq!(array.as_list().value_offsets(), &[0, 3, 3]);

    let inner = array.as_list().values();
    assert_eq!(inner.len(), 3);
    assert_eq!(inner.null_count(), 1);
    assert_eq!(validity(inner), vec![true, false, true]);
    assert_eq!(inner.as_list().value_offsets(), &[0, 2, 2, 2]);

    let leaf = inner.as_list().values();
    assert_eq!(leaf.len(), 2);
    assert_eq!(leaf.null_count(), 0);
    assert_eq!(leaf.as_primitive().typed_values::<i32>(), &[1, 2]);
  }

  #[test]
  fn test_struct_in_list() {
    // Records: [{k: 1, v: 10}, {k: 2, v: null}], []
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("m", Some(Repetition::REQUIRED), LogicalType::LIST, vec![
        group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          group("element", Some(Repetition::REQUIRED), LogicalType::NONE, vec![
            primitive("k", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
            primitive("v", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
          ])
        ])
      ])
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::new(
          vec![1, 1, 0], vec![0, 1, 0], ColumnValues::Int32(vec![1, 2])),
        ColumnChunkData::new(
          vec![2, 1, 0], vec![0, 1, 0], ColumnValues::Int32(vec![10]))
      ])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(array.len(), 2);
    assert_eq!(array.null_count(), 0);
    assert!(array.validity().is_none());
    assert_eq!(array.as_list().value_offsets(), &[0, 2, 2]);

    let entries = array.as_list().values().as_struct();
    assert_eq!(entries.num_children(), 2);
    assert_eq!(array.as_list().values().len(), 2);
    assert_eq!(entries.child(0).as_primitive().typed_values::<i32>(), &[1, 2]);
    assert_eq!(entries.child(0).null_count(), 0);
    assert_eq!(validity(entries.child(1)), vec![true, false]);
    assert_eq!(entries.child(1).as_primitive().typed_values::<i32>()[0], 10);
  }

  #[test]
  fn test_map() {
    // Records: {"a": 1, "b": null}, null, {}
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("m", Some(Repetition::OPTIONAL), LogicalType::MAP, vec![
        group("key_value", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          primitive("key", Repetition::REQUIRED, PhysicalType::BYTE_ARRAY, LogicalType::UTF8),
          primitive("value", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
        ])
      ])
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::new(
          vec![2, 2, 0, 1], vec![0, 1, 0, 0],
          ColumnValues::ByteArray(vec![ByteArray::from("a"), ByteArray::from("b")])),
        ColumnChunkData::new(
          vec![3, 2, 0, 1], vec![0, 1, 0, 0], ColumnValues::Int32(vec![1]))
      ])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(4).unwrap().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.null_count(), 1);
    assert_eq!(validity(&array), vec![true, false, true]);
    assert_eq!(array.as_list().value_offsets(), &[0, 2, 2, 2]);

    let entries = array.as_list().values().as_struct();
    assert_eq!(entries.num_children(), 2);
    assert_eq!(array.as_list().values().len(), 2);
    assert_eq!(entries.child(0).as_binary().str_value(0), "a");
    assert_eq!(entries.child(0).as_binary().str_value(1), "b");
    assert_eq!(validity(entries.child(1)), vec![true, false]);
    assert_eq!(entries.child(1).as_primitive().typed_values::<i32>()[0], 1);
  }

  #[test]
  fn test_required_leaf_under_optional_struct() {
    // A required child still produces a (null) slot when the enclosing
    // struct is absent, so all children agree on length.
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("s", Some(Repetition::OPTIONAL), LogicalType::NONE, vec![
        primitive("k", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
        primitive("v", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
      ])
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::new(vec![1, 0, 1], vec![], ColumnValues::Int32(vec![7, 9])),
        ColumnChunkData::new(vec![2, 0, 1], vec![], ColumnValues::Int32(vec![70]))
      ])
      .build();

    let mut reader = reader_for_field(file, 0);
    let array = reader.next_batch(3).unwrap().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.null_count(), 1);
    assert_eq!(validity(&array), vec![true, false, true]);

    let s = array.as_struct();
    assert_eq!(s.child(0).len(), 3);
    assert_eq!(s.child(1).len(), 3);
    assert_eq!(validity(s.child(0)), vec![true, false, true]);
    assert_eq!(validity(s.child(1)), vec![true, false, false]);
    assert_eq!(s.child(0).as_primitive().typed_values::<i32>()[0], 7);
    assert_eq!(s.child(0).as_primitive().typed_values::<i32>()[2], 9);
    assert_eq!(s.child(1).as_primitive().typed_values::<i32>()[0], 70);
  }

  #[test]
  fn test_build_array_reader_absent_field() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
      primitive("b", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int32(vec![1])),
        ColumnChunkData::required(ColumnValues::Int32(vec![2]))
      ])
      .build();

    let descr = file.metadata().file_metadata().schema_descr().clone();
    let node = descr.root_schema_ptr().get_fields()[0].clone();
    // Only column 1 selected, so field 0 has no reader.
    let reader = build_array_reader(pool(), file, &node, &[1], None).unwrap();
    assert!(reader.is_none());
  }

  #[test]
  fn test_struct_child_length_mismatch() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("s", Some(Repetition::OPTIONAL), LogicalType::NONE, vec![
        primitive("a", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE),
        primitive("b", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
      ])
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::new(vec![2, 2], vec![], ColumnValues::Int32(vec![1, 2])),
        ColumnChunkData::new(vec![2], vec![], ColumnValues::Int32(vec![3]))
      ])
      .build();

    let mut reader = reader_for_field(file, 0);
    match reader.next_batch(2) {
      Err(ParquetError::Invalid(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_random_required_columns() {
    let n = 1024;
    let ints = random_numbers::<i32>(n);
    let flags = random_bools(n);
    let blobs: Vec<ByteArray> = (0..n).map(|i| ByteArray::from(random_bytes(i % 16))).collect();

    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
      primitive("b", Repetition::REQUIRED, PhysicalType::BOOLEAN, LogicalType::NONE),
      primitive("c", Repetition::REQUIRED, PhysicalType::BYTE_ARRAY, LogicalType::NONE)
    ]);
    let split = n / 2;
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int32(ints[..split].to_vec())),
        ColumnChunkData::required(ColumnValues::Bool(flags[..split].to_vec())),
        ColumnChunkData::required(ColumnValues::ByteArray(blobs[..split].to_vec()))
      ])
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int32(ints[split..].to_vec())),
        ColumnChunkData::required(ColumnValues::Bool(flags[split..].to_vec())),
        ColumnChunkData::required(ColumnValues::ByteArray(blobs[split..].to_vec()))
      ])
      .build();

    let array = reader_for_field(file.clone(), 0).next_batch(n).unwrap().unwrap();
    assert_eq!(array.as_primitive().typed_values::<i32>(), ints.as_slice());

    let array = reader_for_field(file.clone(), 1).next_batch(n).unwrap().unwrap();
    for (i, &flag) in flags.iter().enumerate() {
      assert_eq!(array.as_primitive().bool_value(i), flag);
    }

    let array = reader_for_field(file, 2).next_batch(n).unwrap().unwrap();
    for (i, blob) in blobs.iter().enumerate() {
      assert_eq!(array.as_binary().value(i), blob.data());
    }
  }

  #[test]
  fn test_single_row_group_iterator() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int32(vec![1, 2]))])
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int32(vec![3, 4]))])
      .build();

    let descr = file.metadata().file_metadata().schema_descr().clone();
    let node = descr.root_schema_ptr().get_fields()[0].clone();
    let mut reader =
      build_array_reader(pool(), file, &node, &[0], Some(1)).unwrap().unwrap();
    let array = reader.next_batch(4).unwrap().unwrap();
    assert_eq!(array.as_primitive().typed_values::<i32>(), &[3, 4]);
    assert!(reader.next_batch(1).unwrap().is_none());
  }
}
