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

//! High level reader producing tables and field arrays from a physical
//! file reader.

use std::cmp;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::debug;

use crate::arrow::array::{new_empty_array, Array, Table};
use crate::arrow::array_reader::{
  build_array_reader, build_primitive_reader, FileColumnIterator
};
use crate::arrow::datatypes::Schema;
use crate::arrow::schema::{
  column_indices_to_field_indices, parquet_to_arrow_field,
  parquet_to_arrow_schema_by_columns
};
use crate::basic::Type as PhysicalType;
use crate::column::reader::get_typed_column_reader;
use crate::data_type::*;
use crate::errors::{ParquetError, Result};
use crate::file::reader::FileReader;
use crate::util::memory::MemoryPoolPtr;

/// Reads a Parquet file into tables and arrays of the target columnar
/// type system.
///
/// Reads of multiple top-level fields can be parallelized with
/// [`set_num_threads`](Self::set_num_threads); each field is assembled by
/// one task over a disjoint set of leaf columns.
pub struct ArrowReader {
  pool: MemoryPoolPtr,
  file_reader: Arc<dyn FileReader>,
  num_threads: usize
}

impl ArrowReader {
  pub fn new(pool: MemoryPoolPtr, file_reader: Arc<dyn FileReader>) -> Self {
    ArrowReader { pool, file_reader, num_threads: 1 }
  }

  pub fn num_row_groups(&self) -> usize {
    self.file_reader.metadata().num_row_groups()
  }

  /// Worker count for per-field parallelism. One thread reads fields
  /// sequentially on the caller's thread.
  pub fn set_num_threads(&mut self, num_threads: usize) {
    assert!(num_threads >= 1, "num_threads must be at least 1");
    self.num_threads = num_threads;
  }

  /// The converted schema of the whole file.
  pub fn get_schema(&self) -> Result<Schema> {
    let indices: Vec<usize> = (0..self.num_columns()).collect();
    self.get_schema_by_columns(&indices)
  }

  /// The converted schema restricted to the given leaf columns.
  pub fn get_schema_by_columns(&self, column_indices: &[usize]) -> Result<Schema> {
    let metadata = self.file_reader.metadata();
    parquet_to_arrow_schema_by_columns(
      metadata.file_metadata().schema_descr(),
      column_indices,
      metadata.file_metadata().key_value_metadata())
  }

  /// Read one leaf column, flat, across all row groups.
  pub fn read_column(&self, column_index: usize) -> Result<Array> {
    self.check_column_index(column_index)?;
    let metadata = self.file_reader.metadata();
    let descr = metadata.file_metadata().schema_descr().column(column_index);
    let field = parquet_to_arrow_field(&descr)?;
    let input = FileColumnIterator::new(column_index, self.file_reader.clone(), None);
    let mut reader = build_primitive_reader(self.pool.clone(), input, field.data_type().clone())?;

    let mut batch_size = 0usize;
    for i in 0..metadata.num_row_groups() {
      batch_size += metadata.row_group(i).column(column_index).num_values() as usize;
    }
    let array = reader.next_batch(batch_size)?;
    Ok(array.unwrap_or_else(|| new_empty_array(reader.data_type())))
  }

  /// Read the `i`th top-level field across all row groups.
  pub fn read_field(&self, field_index: usize) -> Result<Array> {
    let indices: Vec<usize> = (0..self.num_columns()).collect();
    self.read_field_internal(field_index, &indices, None)
  }

  /// Read the `i`th top-level field restricted to the given leaf columns.
  pub fn read_field_by_columns(&self, field_index: usize, column_indices: &[usize]) -> Result<Array> {
    self.check_column_indices(column_indices)?;
    self.read_field_internal(field_index, column_indices, None)
  }

  /// Read all fields restricted to row group `row_group_index`.
  pub fn read_row_group(&self, row_group_index: usize) -> Result<Table> {
    let indices: Vec<usize> = (0..self.num_columns()).collect();
    self.read_row_group_by_columns(row_group_index, &indices)
  }

  pub fn read_row_group_by_columns(
    &self,
    row_group_index: usize,
    column_indices: &[usize]
  ) -> Result<Table> {
    if row_group_index >= self.num_row_groups() {
      return Err(arg_err!(
        "Row group index {} out of range: the file has {} row groups",
        row_group_index, self.num_row_groups()));
    }
    self.read_table_internal(column_indices, Some(row_group_index))
  }

  /// Read the whole file into one table.
  pub fn read_table(&self) -> Result<Table> {
    let indices: Vec<usize> = (0..self.num_columns()).collect();
    self.read_table_by_columns(&indices)
  }

  pub fn read_table_by_columns(&self, column_indices: &[usize]) -> Result<Table> {
    self.read_table_internal(column_indices, None)
  }

  /// Count the file's records by streaming the given columns (all columns
  /// when empty) in batches of `batch_size`, without materializing arrays.
  pub fn scan_contents(&self, column_indices: &[usize], batch_size: usize) -> Result<i64> {
    if batch_size == 0 {
      return Err(arg_err!("Scan batch size must be positive"));
    }
    let columns: Vec<usize> = if column_indices.is_empty() {
      (0..self.num_columns()).collect()
    } else {
      column_indices.to_vec()
    };
    self.check_column_indices(&columns)?;

    let descr = self.file_reader.metadata().file_metadata().schema_descr().clone();
    let mut total: Option<i64> = None;
    for &i in &columns {
      let input = FileColumnIterator::new(i, self.file_reader.clone(), None);
      let records = scan_column_dispatch(descr.column(i).physical_type(), input, batch_size)?;
      match total {
        Some(expected) if expected != records => {
          return Err(invalid_err!(
            "Column {} holds {} records but a previous column holds {}",
            i, records, expected));
        }
        _ => total = Some(records)
      }
    }
    Ok(total.unwrap_or(0))
  }

  fn num_columns(&self) -> usize {
    self.file_reader.metadata().file_metadata().schema_descr().num_columns()
  }

  fn check_column_index(&self, column_index: usize) -> Result<()> {
    let num_columns = self.num_columns();
    if column_index >= num_columns {
      return Err(arg_err!(
        "Column index {} out of range: the schema has {} columns",
        column_index, num_columns));
    }
    Ok(())
  }

  fn check_column_indices(&self, column_indices: &[usize]) -> Result<()> {
    for &i in column_indices {
      self.check_column_index(i)?;
    }
    Ok(())
  }

  fn read_table_internal(
    &self,
    column_indices: &[usize],
    row_group: Option<usize>
  ) -> Result<Table> {
    let metadata = self.file_reader.metadata();
    let descr = metadata.file_metadata().schema_descr();
    let schema = parquet_to_arrow_schema_by_columns(
      descr, column_indices, metadata.file_metadata().key_value_metadata())?;
    let field_indices = column_indices_to_field_indices(descr, column_indices)?;

    let num_tasks = field_indices.len();
    let num_threads = cmp::min(self.num_threads, cmp::max(num_tasks, 1));
    debug!(
      "reading {} fields from {} columns with {} threads",
      num_tasks, column_indices.len(), num_threads);
    let runner = TaskRunner::new(num_threads);
    let columns = runner.run(num_tasks, |i| {
      self.read_field_internal(field_indices[i], column_indices, row_group)
    })?;
    Ok(Table::new(schema, columns))
  }

  fn read_field_internal(
    &self,
    field_index: usize,
    column_indices: &[usize],
    row_group: Option<usize>
  ) -> Result<Array> {
    let metadata = self.file_reader.metadata();
    let descr = metadata.file_metadata().schema_descr();
    let root_schema = descr.root_schema_ptr();
    let fields = root_schema.get_fields();
    if field_index >= fields.len() {
      return Err(arg_err!(
        "Field index {} out of range: the schema has {} fields",
        field_index, fields.len()));
    }
    let node = fields[field_index].clone();

    let reader = build_array_reader(
      self.pool.clone(), self.file_reader.clone(), &node, column_indices, row_group)?;
    let mut reader = match reader {
      Some(reader) => reader,
      None => {
        return Err(arg_err!(
          "Field {} has no leaf among the requested column indices", node.name()));
      }
    };

    let batch_size = self.compute_batch_size(field_index, column_indices, row_group);
    let array = reader.next_batch(batch_size)?;
    Ok(array.unwrap_or_else(|| new_empty_array(reader.data_type())))
  }

  // For a full-file read: the largest per-column total value count among
  // the field's own leaves, summed across row groups. For a single row
  // group: the largest chunk value count among the requested columns.
  // Either way one `next_batch` call fully drains the subtree.
  fn compute_batch_size(
    &self,
    field_index: usize,
    column_indices: &[usize],
    row_group: Option<usize>
  ) -> usize {
    let metadata = self.file_reader.metadata();
    let descr = metadata.file_metadata().schema_descr();
    let mut batch_size = 0i64;
    match row_group {
      None => {
        for &i in column_indices {
          if descr.get_column_root_idx(i) != field_index {
            continue;
          }
          let mut column_total = 0i64;
          for g in 0..metadata.num_row_groups() {
            column_total += metadata.row_group(g).column(i).num_values();
          }
          batch_size = cmp::max(batch_size, column_total);
        }
      },
      Some(g) => {
        for &i in column_indices {
          batch_size = cmp::max(batch_size, metadata.row_group(g).column(i).num_values());
        }
      }
    }
    batch_size as usize
  }
}

// ----------------------------------------------------------------------
// Streaming scans

fn scan_column_dispatch(
  physical_type: PhysicalType,
  input: FileColumnIterator,
  batch_size: usize
) -> Result<i64> {
  match physical_type {
    PhysicalType::BOOLEAN => scan_column::<BoolType>(input, batch_size),
    PhysicalType::INT32 => scan_column::<Int32Type>(input, batch_size),
    PhysicalType::INT64 => scan_column::<Int64Type>(input, batch_size),
    PhysicalType::INT96 => scan_column::<Int96Type>(input, batch_size),
    PhysicalType::FLOAT => scan_column::<FloatType>(input, batch_size),
    PhysicalType::DOUBLE => scan_column::<DoubleType>(input, batch_size),
    PhysicalType::BYTE_ARRAY => scan_column::<ByteArrayType>(input, batch_size),
    PhysicalType::FIXED_LEN_BYTE_ARRAY => scan_column::<FixedLenByteArrayType>(input, batch_size)
  }
}

// Counts records in one column: entries with repetition level 0, or every
// level entry for columns outside repeated context.
fn scan_column<T: DataType>(mut input: FileColumnIterator, batch_size: usize) -> Result<i64> {
  let descr = input.descr();
  let max_def = descr.max_def_level();
  let max_rep = descr.max_rep_level();
  let mut values = vec![T::T::default(); batch_size];
  let mut def_levels = vec![0i16; if max_def > 0 { batch_size } else { 0 }];
  let mut rep_levels = vec![0i16; if max_rep > 0 { batch_size } else { 0 }];

  let mut records = 0i64;
  while let Some(column_reader) = input.next()? {
    let mut reader = get_typed_column_reader::<T>(column_reader)?;
    loop {
      let (levels_read, _) = reader.read_batch(
        batch_size,
        if max_def > 0 { Some(&mut def_levels) } else { None },
        if max_rep > 0 { Some(&mut rep_levels) } else { None },
        &mut values)?;
      if levels_read == 0 {
        break;
      }
      if max_rep > 0 {
        records += rep_levels[..levels_read].iter().filter(|&&r| r == 0).count() as i64;
      } else {
        records += levels_read as i64;
      }
      if !reader.has_next() {
        break;
      }
    }
  }
  Ok(records)
}

// ----------------------------------------------------------------------
// Task runner

/// Runs `num_tasks` independent tasks on up to `num_threads` worker
/// threads. Workers claim task indices from a shared counter; the first
/// failure stops further task starts and is reported after all workers
/// join. Results are bound by task index, not completion order.
pub struct TaskRunner {
  num_threads: usize
}

impl TaskRunner {
  pub fn new(num_threads: usize) -> Self {
    assert!(num_threads >= 1, "num_threads must be at least 1");
    TaskRunner { num_threads }
  }

  pub fn run<T, F>(&self, num_tasks: usize, task: F) -> Result<Vec<T>>
  where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync
  {
    if self.num_threads == 1 || num_tasks <= 1 {
      return (0..num_tasks).map(&task).collect();
    }

    let task_counter = AtomicUsize::new(0);
    let error_occurred = AtomicBool::new(false);
    let first_error: Mutex<Option<ParquetError>> = Mutex::new(None);
    let mut results: Vec<Option<T>> = (0..num_tasks).map(|_| None).collect();

    thread::scope(|scope| {
      let mut handles = Vec::with_capacity(self.num_threads);
      for _ in 0..self.num_threads {
        handles.push(scope.spawn(|| {
          let mut completed = vec![];
          while !error_occurred.load(Ordering::Acquire) {
            let task_id = task_counter.fetch_add(1, Ordering::SeqCst);
            if task_id >= num_tasks {
              break;
            }
            match task(task_id) {
              Ok(value) => completed.push((task_id, value)),
              Err(e) => {
                let mut slot = first_error.lock().unwrap();
                if slot.is_none() {
                  *slot = Some(e);
                }
                error_occurred.store(true, Ordering::Release);
                break;
              }
            }
          }
          completed
        }));
      }
      for handle in handles {
        match handle.join() {
          Ok(completed) => {
            for (task_id, value) in completed {
              results[task_id] = Some(value);
            }
          },
          Err(panic) => std::panic::resume_unwind(panic)
        }
      }
    });

    if let Some(e) = first_error.into_inner().unwrap() {
      return Err(e);
    }
    let mut output = Vec::with_capacity(num_tasks);
    for (i, slot) in results.into_iter().enumerate() {
      match slot {
        Some(value) => output.push(value),
        None => return Err(invalid_err!("Task {} produced no result", i))
      }
    }
    Ok(output)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arrow::datatypes::DataType;
  use crate::basic::{LogicalType, Repetition};
  use crate::schema::types::{Type as SchemaType, TypePtr};
  use crate::util::memory::DefaultMemoryPool;
  use crate::util::test_common::*;
  use std::collections::HashMap;

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

  fn group(
    name: &str,
    repetition: Option<Repetition>,
    logical_type: LogicalType,
    fields: Vec<TypePtr>
  ) -> TypePtr {
    Arc::new(SchemaType::new_group_type(name, repetition, logical_type, fields).unwrap())
  }

  // message schema { required int64 a; optional double b; }
  // a = [1, 2, 3, 4, 5], b = [null, 2.0, null, 4.0, 5.0]
  fn flat_file() -> Arc<InMemoryFileReader> {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT64, LogicalType::NONE),
      primitive("b", Repetition::OPTIONAL, PhysicalType::DOUBLE, LogicalType::NONE)
    ]);
    TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int64(vec![1, 2, 3, 4, 5])),
        ColumnChunkData::new(
          vec![0, 1, 0, 1, 1], vec![], ColumnValues::Double(vec![2.0, 4.0, 5.0]))
      ])
      .build()
  }

  // message schema { optional group xs (LIST) { repeated group list {
  //   optional int32 element; } } }
  // xs = [null, [], [1, null, 3], [4]]
  fn list_file() -> Arc<InMemoryFileReader> {
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("xs", Some(Repetition::OPTIONAL), LogicalType::LIST, vec![
        group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          primitive("element", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
        ])
      ])
    ]);
    TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![0, 1, 3, 2, 3, 3],
        vec![0, 0, 0, 1, 1, 0],
        ColumnValues::Int32(vec![1, 3, 4]))])
      .build()
  }

  fn validity(array: &Array) -> Vec<bool> {
    (0..array.len()).map(|i| array.is_valid(i)).collect()
  }

  fn assert_table_equals(left: &Table, right: &Table) {
    assert_eq!(left.schema(), right.schema());
    assert_eq!(left.num_rows(), right.num_rows());
    for c in 0..left.num_columns() {
      let (l, r) = (left.column(c), right.column(c));
      assert_eq!(l.data_type(), r.data_type());
      assert_eq!(l.len(), r.len());
      assert_eq!(l.null_count(), r.null_count());
      for i in 0..l.len() {
        assert_eq!(l.is_valid(i), r.is_valid(i));
        if !l.is_valid(i) {
          continue;
        }
        match *l.data_type() {
          DataType::Int32 => assert_eq!(
            l.as_primitive().typed_values::<i32>()[i],
            r.as_primitive().typed_values::<i32>()[i]),
          DataType::Int64 => assert_eq!(
            l.as_primitive().typed_values::<i64>()[i],
            r.as_primitive().typed_values::<i64>()[i]),
          DataType::Float64 => assert_eq!(
            l.as_primitive().typed_values::<f64>()[i],
            r.as_primitive().typed_values::<f64>()[i]),
          DataType::Utf8 => assert_eq!(l.as_binary().value(i), r.as_binary().value(i)),
          ref other => panic!("no comparison for {}", other)
        }
      }
    }
  }

  #[test]
  fn test_read_table_flat() {
    let reader = ArrowReader::new(pool(), flat_file());
    let table = reader.read_table().unwrap();
    assert_eq!(table.num_columns(), 2);
    assert_eq!(table.num_rows(), 5);

    let a = table.column(0);
    assert_eq!(a.len(), 5);
    assert!(a.validity().is_none());
    assert_eq!(a.as_primitive().typed_values::<i64>(), &[1, 2, 3, 4, 5]);

    let b = table.column(1);
    assert_eq!(b.len(), 5);
    assert_eq!(b.null_count(), 2);
    assert_eq!(validity(b), vec![false, true, false, true, true]);
    let values = b.as_primitive().typed_values::<f64>();
    assert_eq!(values[1], 2.0);
    assert_eq!(values[3], 4.0);
    assert_eq!(values[4], 5.0);
  }

  #[test]
  fn test_read_table_nested() {
    let reader = ArrowReader::new(pool(), list_file());
    let table = reader.read_table().unwrap();
    assert_eq!(table.num_columns(), 1);
    assert_eq!(table.num_rows(), 4);

    let xs = table.column(0);
    assert_eq!(validity(xs), vec![false, true, true, true]);
    assert_eq!(xs.as_list().value_offsets(), &[0, 0, 0, 3, 4]);
    assert_eq!(xs.as_list().values().len(), 4);
  }

  #[test]
  fn test_read_table_by_columns_order() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
      primitive("b", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
      primitive("c", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int32(vec![1])),
        ColumnChunkData::required(ColumnValues::Int32(vec![2])),
        ColumnChunkData::required(ColumnValues::Int32(vec![3]))
      ])
      .build();

    let reader = ArrowReader::new(pool(), file);
    // Indices out of order still bind columns in schema order.
    let table = reader.read_table_by_columns(&[2, 0]).unwrap();
    assert_eq!(table.num_columns(), 2);
    assert_eq!(table.schema().field(0).name(), "a");
    assert_eq!(table.schema().field(1).name(), "c");
    assert_eq!(table.column(0).as_primitive().typed_values::<i32>(), &[1]);
    assert_eq!(table.column(1).as_primitive().typed_values::<i32>(), &[3]);
  }

  #[test]
  fn test_read_row_group_boundary() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int32(vec![1, 2, 3]))])
      .row_group(vec![ColumnChunkData::required(ColumnValues::Int32(vec![4, 5, 6]))])
      .build();

    let reader = ArrowReader::new(pool(), file);
    assert_eq!(reader.num_row_groups(), 2);

    let table = reader.read_row_group(1).unwrap();
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.column(0).as_primitive().typed_values::<i32>(), &[4, 5, 6]);

    let table = reader.read_table().unwrap();
    assert_eq!(table.num_rows(), 6);
    assert_eq!(table.column(0).as_primitive().typed_values::<i32>(), &[1, 2, 3, 4, 5, 6]);

    match reader.read_row_group(2) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_parallelism_equivalence() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT64, LogicalType::NONE),
      primitive("b", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE),
      primitive("c", Repetition::OPTIONAL, PhysicalType::DOUBLE, LogicalType::NONE),
      primitive("d", Repetition::OPTIONAL, PhysicalType::BYTE_ARRAY, LogicalType::UTF8)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int64(vec![1, 2, 3])),
        ColumnChunkData::new(vec![1, 0, 1], vec![], ColumnValues::Int32(vec![10, 30])),
        ColumnChunkData::new(vec![0, 1, 1], vec![], ColumnValues::Double(vec![0.2, 0.3])),
        ColumnChunkData::new(
          vec![1, 1, 0], vec![],
          ColumnValues::ByteArray(vec![ByteArray::from("x"), ByteArray::from("yy")]))
      ])
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int64(vec![4, 5])),
        ColumnChunkData::new(vec![1, 1], vec![], ColumnValues::Int32(vec![40, 50])),
        ColumnChunkData::new(vec![0, 0], vec![], ColumnValues::Double(vec![])),
        ColumnChunkData::new(
          vec![0, 1], vec![], ColumnValues::ByteArray(vec![ByteArray::from("zzz")]))
      ])
      .build();

    let mut reader = ArrowReader::new(pool(), file);
    let sequential = reader.read_table().unwrap();
    assert_eq!(sequential.num_rows(), 5);

    for num_threads in [2, 4, 8] {
      reader.set_num_threads(num_threads);
      let parallel = reader.read_table().unwrap();
      assert_table_equals(&sequential, &parallel);
    }
  }

  #[test]
  fn test_read_column() {
    let reader = ArrowReader::new(pool(), flat_file());
    let array = reader.read_column(0).unwrap();
    assert_eq!(array.as_primitive().typed_values::<i64>(), &[1, 2, 3, 4, 5]);

    // A nested leaf read flat: one slot per existing list element position.
    let reader = ArrowReader::new(pool(), list_file());
    let array = reader.read_column(0).unwrap();
    assert_eq!(array.len(), 4);
    assert_eq!(validity(&array), vec![true, false, true, true]);

    match ArrowReader::new(pool(), flat_file()).read_column(9) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_read_field() {
    let reader = ArrowReader::new(pool(), list_file());
    let array = reader.read_field(0).unwrap();
    assert_eq!(array.len(), 4);
    assert_eq!(array.as_list().value_offsets(), &[0, 0, 0, 3, 4]);

    match reader.read_field(5) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
    match reader.read_field_by_columns(0, &[9]) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }

    // Valid indices that leave the field without leaves are inconsistent.
    let reader = ArrowReader::new(pool(), flat_file());
    match reader.read_field_by_columns(0, &[1]) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_get_schema() {
    let mut kv = HashMap::new();
    kv.insert("writer".to_owned(), "unit-test".to_owned());
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT64, LogicalType::NONE),
      primitive("b", Repetition::OPTIONAL, PhysicalType::DOUBLE, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .key_value_metadata(kv)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int64(vec![1])),
        ColumnChunkData::new(vec![1], vec![], ColumnValues::Double(vec![0.5]))
      ])
      .build();

    let reader = ArrowReader::new(pool(), file);
    let schema = reader.get_schema().unwrap();
    assert_eq!(schema.num_fields(), 2);
    assert_eq!(*schema.field(0).data_type(), DataType::Int64);
    assert_eq!(*schema.field(1).data_type(), DataType::Float64);
    assert_eq!(schema.metadata().get("writer"), Some(&"unit-test".to_owned()));

    let pruned = reader.get_schema_by_columns(&[1]).unwrap();
    assert_eq!(pruned.num_fields(), 1);
    assert_eq!(pruned.field(0).name(), "b");
  }

  #[test]
  fn test_scan_contents() {
    let reader = ArrowReader::new(pool(), flat_file());
    assert_eq!(reader.scan_contents(&[], 2).unwrap(), 5);
    assert_eq!(reader.scan_contents(&[0], 1000).unwrap(), 5);

    let reader = ArrowReader::new(pool(), list_file());
    assert_eq!(reader.scan_contents(&[], 2).unwrap(), 4);

    match ArrowReader::new(pool(), flat_file()).scan_contents(&[], 0) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_scan_contents_row_count_mismatch() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE),
      primitive("b", Repetition::REQUIRED, PhysicalType::INT32, LogicalType::NONE)
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::required(ColumnValues::Int32(vec![1, 2, 3])),
        ColumnChunkData::required(ColumnValues::Int32(vec![1, 2]))
      ])
      .build();

    match ArrowReader::new(pool(), file).scan_contents(&[], 8) {
      Err(ParquetError::Invalid(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_invalid_column_indices() {
    let reader = ArrowReader::new(pool(), flat_file());
    match reader.read_table_by_columns(&[7]) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
    match reader.scan_contents(&[7], 8) {
      Err(ParquetError::InvalidArgument(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_unsupported_logical_type() {
    let decimal = Arc::new(SchemaType::new_primitive_type(
      "d", Repetition::OPTIONAL, PhysicalType::BYTE_ARRAY,
      LogicalType::DECIMAL, 0, 10, 2).unwrap());
    let schema = group("schema", None, LogicalType::NONE, vec![decimal]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![ColumnChunkData::new(
        vec![0], vec![], ColumnValues::ByteArray(vec![]))])
      .build();

    let reader = ArrowReader::new(pool(), file);
    match reader.read_table() {
      Err(ParquetError::NotImplemented(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
    match reader.read_column(0) {
      Err(ParquetError::NotImplemented(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_multi_child_list_element() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      group("xs", Some(Repetition::OPTIONAL), LogicalType::LIST, vec![
        group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          primitive("e1", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE),
          primitive("e2", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
        ])
      ])
    ]);
    let file = TestFileBuilder::new(schema)
      .row_group(vec![
        ColumnChunkData::new(vec![0], vec![0], ColumnValues::Int32(vec![])),
        ColumnChunkData::new(vec![0], vec![0], ColumnValues::Int32(vec![]))
      ])
      .build();

    match ArrowReader::new(pool(), file).read_table() {
      Err(ParquetError::NotImplemented(_)) => {},
      other => panic!("unexpected result: {:?}", other)
    }
  }

  #[test]
  fn test_empty_file() {
    let schema = group("schema", None, LogicalType::NONE, vec![
      primitive("a", Repetition::REQUIRED, PhysicalType::INT64, LogicalType::NONE),
      group("xs", Some(Repetition::OPTIONAL), LogicalType::LIST, vec![
        group("list", Some(Repetition::REPEATED), LogicalType::NONE, vec![
          primitive("element", Repetition::OPTIONAL, PhysicalType::INT32, LogicalType::NONE)
        ])
      ])
    ]);
    let file = TestFileBuilder::new(schema).build();

    let reader = ArrowReader::new(pool(), file);
    assert_eq!(reader.num_row_groups(), 0);

    let table = reader.read_table().unwrap();
    assert_eq!(table.num_columns(), 2);
    assert_eq!(table.num_rows(), 0);
    assert_eq!(*table.column(0).data_type(), DataType::Int64);
    assert_eq!(table.column(1).as_list().value_offsets(), &[0]);

    let array = reader.read_column(0).unwrap();
    assert_eq!(array.len(), 0);
  }

  #[test]
  fn test_task_runner_binds_results_by_task_index() {
    for num_threads in [1, 2, 4] {
      let runner = TaskRunner::new(num_threads);
      let results = runner.run(8, |i| Ok(i * 10)).unwrap();
      assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }
    assert_eq!(TaskRunner::new(4).run(0, |i| Ok(i)).unwrap(), Vec::<usize>::new());
  }

  #[test]
  fn test_task_runner_first_error_wins() {
    for num_threads in [1, 2, 4] {
      let runner = TaskRunner::new(num_threads);
      let result: Result<Vec<usize>> = runner.run(8, |i| {
        if i == 3 {
          Err(arg_err!("task {} failed", i))
        } else {
          Ok(i)
        }
      });
      match result {
        Err(ParquetError::InvalidArgument(m)) => assert_eq!(m, "task 3 failed"),
        other => panic!("unexpected result: {:?}", other)
      }
    }
  }
}
