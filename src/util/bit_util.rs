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

//! Bit twiddling for validity bitmaps and bit-packed boolean values.

/// Number of bytes needed to hold `num_bits` bits.
#[inline]
pub fn bytes_for_bits(num_bits: usize) -> usize {
  (num_bits + 7) / 8
}

#[inline]
pub fn set_array_bit(bits: &mut [u8], i: usize) {
  bits[i / 8] |= 1 << (i % 8);
}

#[inline]
pub fn unset_array_bit(bits: &mut [u8], i: usize) {
  bits[i / 8] &= !(1 << (i % 8));
}

#[inline]
pub fn get_array_bit(bits: &[u8], i: usize) -> bool {
  bits[i / 8] & (1 << (i % 8)) != 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bytes_for_bits() {
    assert_eq!(bytes_for_bits(0), 0);
    assert_eq!(bytes_for_bits(1), 1);
    assert_eq!(bytes_for_bits(8), 1);
    assert_eq!(bytes_for_bits(9), 2);
    assert_eq!(bytes_for_bits(64), 8);
    assert_eq!(bytes_for_bits(65), 9);
  }

  #[test]
  fn test_set_array_bit() {
    let mut buffer = vec![0, 0, 0];
    set_array_bit(&mut buffer[..], 1);
    assert_eq!(buffer, vec![2, 0, 0]);
    set_array_bit(&mut buffer[..], 4);
    assert_eq!(buffer, vec![18, 0, 0]);
    unset_array_bit(&mut buffer[..], 1);
    assert_eq!(buffer, vec![16, 0, 0]);
    set_array_bit(&mut buffer[..], 10);
    assert_eq!(buffer, vec![16, 4, 0]);
    set_array_bit(&mut buffer[..], 10);
    assert_eq!(buffer, vec![16, 4, 0]);
    set_array_bit(&mut buffer[..], 11);
    assert_eq!(buffer, vec![16, 12, 0]);
    unset_array_bit(&mut buffer[..], 10);
    assert_eq!(buffer, vec![16, 8, 0]);
  }

  #[test]
  fn test_get_array_bit() {
    let mut buffer = vec![0; 2];
    assert!(!get_array_bit(&buffer[..], 0));
    set_array_bit(&mut buffer[..], 0);
    assert!(get_array_bit(&buffer[..], 0));
    set_array_bit(&mut buffer[..], 15);
    assert!(get_array_bit(&buffer[..], 15));
    assert!(!get_array_bit(&buffer[..], 14));
  }
}
