//! Reusable ray-casting primitives.
//!
//! Picking runs on every pointer move, so the rays and vectors it needs are
//! cycled through small pools instead of being created per event. Pools
//! pre-warm a fixed number of instances and grow on demand; `acquire` never
//! fails.

use std::ops::{Deref, DerefMut};

use glam::{Vec2, Vec3};

use crate::ray::Ray;

/// A primitive that can be reset to a neutral state for reuse
pub trait Poolable {
    /// A new instance in its neutral state
    fn fresh() -> Self;
    /// Restore the neutral state
    fn reset(&mut self);
}

impl Poolable for Ray {
    fn fresh() -> Self {
        Ray::default()
    }

    fn reset(&mut self) {
        *self = Ray::default();
    }
}

impl Poolable for Vec2 {
    fn fresh() -> Self {
        Vec2::ZERO
    }

    fn reset(&mut self) {
        *self = Vec2::ZERO;
    }
}

impl Poolable for Vec3 {
    fn fresh() -> Self {
        Vec3::ZERO
    }

    fn reset(&mut self) {
        *self = Vec3::ZERO;
    }
}

/// Free list of one primitive kind
#[derive(Debug)]
pub struct PrimitivePool<T: Poolable> {
    free: Vec<T>,
    created: usize,
}

impl<T: Poolable> PrimitivePool<T> {
    /// Create a pool holding `prewarm` ready instances
    pub fn with_prewarm(prewarm: usize) -> Self {
        Self {
            free: (0..prewarm).map(|_| T::fresh()).collect(),
            created: prewarm,
        }
    }

    /// Take an instance in its neutral state, creating one if the pool is dry
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(item) => item,
            None => {
                self.created += 1;
                T::fresh()
            }
        }
    }

    /// Reset an instance and return it to the pool
    pub fn release(&mut self, mut item: T) {
        item.reset();
        self.free.push(item);
    }

    /// Acquire an instance that is released automatically when dropped
    pub fn lease(&mut self) -> Lease<'_, T> {
        let item = self.acquire();
        Lease {
            pool: self,
            item: Some(item),
        }
    }

    /// Instances currently waiting in the pool
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Instances created over the pool's lifetime
    pub fn created(&self) -> usize {
        self.created
    }
}

/// Scoped pool instance; returns itself to the pool on drop, including on early return
pub struct Lease<'a, T: Poolable> {
    pool: &'a mut PrimitivePool<T>,
    item: Option<T>,
}

impl<T: Poolable> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only taken in Drop
        self.item.as_ref().unwrap_or_else(|| unreachable!("lease used after release"))
    }
}

impl<T: Poolable> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap_or_else(|| unreachable!("lease used after release"))
    }
}

impl<T: Poolable> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

/// The pools picking draws from, one per primitive kind
#[derive(Debug)]
pub struct PrimitivePools {
    pub rays: PrimitivePool<Ray>,
    pub vec2s: PrimitivePool<Vec2>,
    pub vec3s: PrimitivePool<Vec3>,
}

impl PrimitivePools {
    pub fn with_prewarm(prewarm: usize) -> Self {
        Self {
            rays: PrimitivePool::with_prewarm(prewarm),
            vec2s: PrimitivePool::with_prewarm(prewarm),
            vec3s: PrimitivePool::with_prewarm(prewarm),
        }
    }
}

impl Default for PrimitivePools {
    fn default() -> Self {
        Self::with_prewarm(5)
    }
}
