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

//! Test helpers: random data generation and an in-memory physical reader
//! serving pre-shredded `(values, def, rep)` column chunks.

use std::cmp;
use std::collections::HashMap;
use std::sync::Arc;

use rand::distributions::{Distribution, Standard};
use rand::{thread_rng, Rng};

use crate::column::reader::{ColumnReader, TypedColumnReader};
use crate::data_type::*;
use crate::errors::Result;
use crate::file::metadata::{ColumnChunkMetaData, FileMetaData, ParquetMetaData, RowGroupMetaData};
use crate::file::reader::{FileReader, RowGroupReader};
use crate::schema::types::{SchemaDescPtr, SchemaDescriptor, TypePtr};
use crate::util::bit_util;

pub fn random_bytes(n: usize) -> Vec<u8> {
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen()).collect()
}

pub fn random_bools(n: usize) -> Vec<bool> {
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen()).collect()
}

pub fn random_numbers<T>(n: usize) -> Vec<T>
where Standard: Distribution<T> {
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen()).collect()
}

// ----------------------------------------------------------------------
// In-memory physical reader

/// One typed column chunk serving decoded values and levels to the
/// assembly layer.
pub struct InMemoryColumnChunk<T: DataType> {
  pub def_levels: Vec<i16>,
  pub rep_levels: Vec<i16>,
  pub values: Vec<T::T>,
  pub max_def_level: i16,
  pub levels_pos: usize,
  pub values_pos: usize
}

impl<T: DataType> InMemoryColumnChunk<T> {
  fn num_levels(&self) -> usize {
    if self.def_levels.is_empty() {
      self.values.len()
    } else {
      self.def_levels.len()
    }
  }

  fn def_at(&self, i: usize) -> i16 {
    if self.def_levels.is_empty() {
      self.max_def_level
    } else {
      self.def_levels[i]
    }
  }
}

impl<T: DataType> TypedColumnReader<T> for InMemoryColumnChunk<T> {
  fn read_batch(
    &mut self,
    batch_size: usize,
    mut def_levels: Option<&mut [i16]>,
    mut rep_levels: Option<&mut [i16]>,
    values: &mut [T::T]
  ) -> Result<(usize, usize)> {
    let end = cmp::min(self.levels_pos + batch_size, self.num_levels());
    let levels_read = end - self.levels_pos;
    let mut values_read = 0;
    for i in self.levels_pos..end {
      let def = self.def_at(i);
      if let Some(ref mut out) = def_levels {
        out[i - self.levels_pos] = def;
      }
      if let Some(ref mut out) = rep_levels {
        out[i - self.levels_pos] = self.rep_levels.get(i).copied().unwrap_or(0);
      }
      if def == self.max_def_level {
        values[values_read] = self.values[self.values_pos + values_read].clone();
        values_read += 1;
      }
    }
    self.levels_pos = end;
    self.values_pos += values_read;
    Ok((levels_read, values_read))
  }

  fn read_batch_spaced(
    &mut self,
    batch_size: usize,
    def_levels: &mut [i16],
    mut rep_levels: Option<&mut [i16]>,
    values: &mut [T::T],
    valid_bits: &mut [u8],
    valid_bits_offset: usize
  ) -> Result<(usize, usize, usize)> {
    let end = cmp::min(self.levels_pos + batch_size, self.num_levels());
    let levels_read = end - self.levels_pos;
    let mut values_read = 0;
    let mut null_count = 0;
    for i in self.levels_pos..end {
      let slot = i - self.levels_pos;
      let def = self.def_at(i);
      def_levels[slot] = def;
      if let Some(ref mut out) = rep_levels {
        out[slot] = self.rep_levels.get(i).copied().unwrap_or(0);
      }
      if def == self.max_def_level {
        values[slot] = self.values[self.values_pos + values_read].clone();
        bit_util::set_array_bit(valid_bits, valid_bits_offset + slot);
        values_read += 1;
      } else {
        null_count += 1;
      }
    }
    self.levels_pos = end;
    self.values_pos += values_read;
    Ok((levels_read, values_read, null_count))
  }

  fn has_next(&self) -> bool {
    self.levels_pos < self.num_levels()
  }
}

/// Decoded values of one column chunk, tagged by physical type.
#[derive(Clone)]
pub enum ColumnValues {
  Bool(Vec<bool>),
  Int32(Vec<i32>),
  Int64(Vec<i64>),
  Int96(Vec<Int96>),
  Float(Vec<f32>),
  Double(Vec<f64>),
  ByteArray(Vec<ByteArray>),
  FixedLenByteArray(Vec<ByteArray>)
}

impl ColumnValues {
  pub fn len(&self) -> usize {
    match *self {
      ColumnValues::Bool(ref v) => v.len(),
      ColumnValues::Int32(ref v) => v.len(),
      ColumnValues::Int64(ref v) => v.len(),
      ColumnValues::Int96(ref v) => v.len(),
      ColumnValues::Float(ref v) => v.len(),
      ColumnValues::Double(ref v) => v.len(),
      ColumnValues::ByteArray(ref v) => v.len(),
      ColumnValues::FixedLenByteArray(ref v) => v.len()
    }
  }
}

/// Shredded data of one column chunk. For columns with `max_def_level == 0`
/// (and no repeated ancestors) the level vectors stay empty.
#[derive(Clone)]
pub struct ColumnChunkData {
  pub def_levels: Vec<i16>,
  pub rep_levels: Vec<i16>,
  pub values: ColumnValues
}

impl ColumnChunkData {
  pub fn new(def_levels: Vec<i16>, rep_levels: Vec<i16>, values: ColumnValues) -> Self {
    ColumnChunkData { def_levels, rep_levels, values }
  }

  pub fn required(values: ColumnValues) -> Self {
    Self::new(vec![], vec![], values)
  }

  pub fn num_levels(&self) -> usize {
    if self.def_levels.is_empty() {
      self.values.len()
    } else {
      self.def_levels.len()
    }
  }

  pub fn num_records(&self) -> usize {
    if self.rep_levels.is_empty() {
      self.num_levels()
    } else {
      self.rep_levels.iter().filter(|&&r| r == 0).count()
    }
  }
}

/// An in-memory [`FileReader`] over pre-shredded row groups.
pub struct InMemoryFileReader {
  metadata: ParquetMetaData,
  row_groups: Vec<Vec<ColumnChunkData>>
}

impl FileReader for InMemoryFileReader {
  fn metadata(&self) -> &ParquetMetaData {
    &self.metadata
  }

  fn get_row_group<'a>(&'a self, i: usize) -> Result<Box<dyn RowGroupReader + 'a>> {
    if i >= self.row_groups.len() {
      return Err(arg_err!(
        "Row group index {} out of range: the file has {} row groups",
        i, self.row_groups.len()));
    }
    Ok(Box::new(InMemoryRowGroupReader { file: self, index: i }))
  }
}

struct InMemoryRowGroupReader<'a> {
  file: &'a InMemoryFileReader,
  index: usize
}

impl<'a> RowGroupReader for InMemoryRowGroupReader<'a> {
  fn metadata(&self) -> &RowGroupMetaData {
    self.file.metadata.row_group(self.index)
  }

  fn get_column_reader(&self, i: usize) -> Result<ColumnReader> {
    let columns = &self.file.row_groups[self.index];
    if i >= columns.len() {
      return Err(arg_err!(
        "Column index {} out of range: the row group has {} columns",
        i, columns.len()));
    }
    let chunk = &columns[i];
    let descr = self.file.metadata.file_metadata().schema_descr().column(i);

    macro_rules! make_chunk {
      ($variant:ident, $values:expr) => {
        ColumnReader::$variant(Box::new(InMemoryColumnChunk {
          def_levels: chunk.def_levels.clone(),
          rep_levels: chunk.rep_levels.clone(),
          values: $values.clone(),
          max_def_level: descr.max_def_level(),
          levels_pos: 0,
          values_pos: 0
        }))
      };
    }

    let reader = match chunk.values {
      ColumnValues::Bool(ref v) => make_chunk!(BoolColumnReader, v),
      ColumnValues::Int32(ref v) => make_chunk!(Int32ColumnReader, v),
      ColumnValues::Int64(ref v) => make_chunk!(Int64ColumnReader, v),
      ColumnValues::Int96(ref v) => make_chunk!(Int96ColumnReader, v),
      ColumnValues::Float(ref v) => make_chunk!(FloatColumnReader, v),
      ColumnValues::Double(ref v) => make_chunk!(DoubleColumnReader, v),
      ColumnValues::ByteArray(ref v) => make_chunk!(ByteArrayColumnReader, v),
      ColumnValues::FixedLenByteArray(ref v) => make_chunk!(FixedLenByteArrayColumnReader, v)
    };
    Ok(reader)
  }
}

/// Builds an [`InMemoryFileReader`] for a schema plus per-row-group column
/// chunk data.
pub struct TestFileBuilder {
  descr: SchemaDescPtr,
  key_value_metadata: Option<HashMap<String, String>>,
  row_groups: Vec<Vec<ColumnChunkData>>
}

impl TestFileBuilder {
  pub fn new(schema: TypePtr) -> Self {
    TestFileBuilder {
      descr: Arc::new(SchemaDescriptor::new(schema)),
      key_value_metadata: None,
      row_groups: vec![]
    }
  }

  pub fn key_value_metadata(mut self, kv: HashMap<String, String>) -> Self {
    self.key_value_metadata = Some(kv);
    self
  }

  /// Append a row group; `columns` must follow the schema's leaf order.
  pub fn row_group(mut self, columns: Vec<ColumnChunkData>) -> Self {
    assert_eq!(columns.len(), self.descr.num_columns());
    self.row_groups.push(columns);
    self
  }

  pub fn build(self) -> Arc<InMemoryFileReader> {
    let mut row_group_metadata = vec![];
    let mut total_rows = 0i64;
    for columns in &self.row_groups {
      let chunks = columns.iter().enumerate()
        .map(|(i, c)| ColumnChunkMetaData::new(&self.descr.column(i), c.num_levels() as i64))
        .collect();
      let num_rows = columns.first().map(|c| c.num_records()).unwrap_or(0) as i64;
      total_rows += num_rows;
      row_group_metadata.push(RowGroupMetaData::new(chunks, num_rows));
    }
    let file_metadata = FileMetaData::new(
      total_rows, None, self.key_value_metadata, self.descr.clone());
    Arc::new(InMemoryFileReader {
      metadata: ParquetMetaData::new(file_metadata, row_group_metadata),
      row_groups: self.row_groups
    })
  }
}
